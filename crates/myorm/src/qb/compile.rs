//! Condition tree compiler.
//!
//! `compile()` walks a [`Where`] tree and produces a predicate string with `?`
//! placeholders plus the matching parameter list. Column names are embedded as
//! sanitized literal text; every value is bound positionally.

use crate::condition::{BoolOp, Cond, Like, Op, Test, Where};
use crate::error::{OrmError, OrmResult, builder_msg};
use crate::ident::sanitize_column;
use crate::value::Value;

const OPERATION: &str = "processConditions";

/// Compile a condition tree, joining the root's fragments with `joiner`.
pub(crate) fn compile(node: &Where, joiner: BoolOp) -> OrmResult<(String, Vec<Value>)> {
    let mut params = Vec::new();
    let clause = build_node(node, joiner, &mut params)?;
    Ok((clause, params))
}

fn build_node(node: &Where, joiner: BoolOp, params: &mut Vec<Value>) -> OrmResult<String> {
    let mut parts = Vec::with_capacity(node.entries().len());
    // Indexes into `parts` holding caller-written SQL.
    let mut raw = Vec::new();
    for cond in node.entries() {
        match cond {
            Cond::And(children) => parts.push(build_group(children, BoolOp::And, params)?),
            Cond::Or(children) => parts.push(build_group(children, BoolOp::Or, params)?),
            Cond::Column { column, test } => build_column(column, test, params, &mut parts)?,
            Cond::Raw { sql, params: bound } => {
                raw.push(parts.len());
                parts.push(sql.trim().to_string());
                params.extend(bound.iter().cloned());
            }
        }
    }

    // A raw fragment joined with siblings keeps its own precedence.
    if parts.iter().filter(|p| !p.is_empty()).count() > 1 {
        for idx in raw {
            if !parts[idx].is_empty() {
                parts[idx] = format!("({})", parts[idx]);
            }
        }
    }
    parts.retain(|p| !p.is_empty());
    Ok(parts.join(&format!(" {} ", joiner.as_str())))
}

fn build_group(children: &[Where], op: BoolOp, params: &mut Vec<Value>) -> OrmResult<String> {
    if children.is_empty() {
        return Err(OrmError::EmptyArrayCondition(builder_msg(
            OPERATION,
            format!("{} :: condition must be a non-empty array", op.as_str()),
        )));
    }
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let sql = build_node(child, op, params)?;
        if !sql.is_empty() {
            parts.push(format!("({sql})"));
        }
    }
    Ok(parts.join(&format!(" {} ", op.as_str())))
}

fn build_column(
    column: &str,
    test: &Test,
    params: &mut Vec<Value>,
    parts: &mut Vec<String>,
) -> OrmResult<()> {
    let col = sanitize_column(column);
    if col.is_empty() {
        return Err(OrmError::validation(builder_msg(
            OPERATION,
            format!("Invalid column name: {column:?}"),
        )));
    }

    match test {
        Test::Value(value) => {
            parts.push(format!("{col} = ?"));
            params.push(value.clone());
        }
        Test::List(values) => parts.push(in_list(&col, "IN", values, params)?),
        Test::Ops(ops) => {
            for op in ops {
                parts.push(build_op(&col, op, params)?);
            }
        }
    }
    Ok(())
}

fn build_op(col: &str, op: &Op, params: &mut Vec<Value>) -> OrmResult<String> {
    let sql = match op {
        Op::Eq(v) | Op::Ne(v) | Op::Lt(v) | Op::Lte(v) | Op::Gt(v) | Op::Gte(v) => {
            params.push(v.clone());
            format!("{col} {} ?", op.name())
        }
        Op::Like(pattern) => like(col, "LIKE", pattern, params)?,
        Op::NotLike(pattern) => like(col, "NOT LIKE", pattern, params)?,
        Op::Regexp(v) => match v {
            Value::Text(s) if !s.is_empty() => {
                params.push(v.clone());
                format!("{col} REGEXP ?")
            }
            _ => {
                return Err(OrmError::validation(builder_msg(
                    OPERATION,
                    "REGEXP :: value must be a non-empty string",
                )));
            }
        },
        Op::In(values) => in_list(col, "IN", values, params)?,
        Op::NotIn(values) => in_list(col, "NOT IN", values, params)?,
        Op::Between(bounds) => between(col, "BETWEEN", op.name(), bounds, params)?,
        Op::NotBetween(bounds) => between(col, "NOT BETWEEN", op.name(), bounds, params)?,
        Op::IsNull(flag) => {
            require_true(op.name(), flag)?;
            format!("{col} IS NULL")
        }
        Op::IsNotNull(flag) => {
            require_true(op.name(), flag)?;
            format!("{col} IS NOT NULL")
        }
    };
    Ok(sql)
}

fn like(col: &str, keyword: &str, pattern: &Like, params: &mut Vec<Value>) -> OrmResult<String> {
    let text = match pattern {
        Like::Pattern(p) => p.clone(),
        Like::Contains(s) | Like::StartsWith(s) | Like::EndsWith(s) if s.is_empty() => {
            return Err(crate::condition::invalid_pattern(keyword));
        }
        Like::Contains(s) => format!("%{s}%"),
        Like::StartsWith(s) => format!("{s}%"),
        Like::EndsWith(s) => format!("%{s}"),
    };
    params.push(Value::Text(text));
    Ok(format!("{col} {keyword} ?"))
}

fn in_list(col: &str, keyword: &str, values: &[Value], params: &mut Vec<Value>) -> OrmResult<String> {
    if values.is_empty() {
        return Err(OrmError::EmptyArrayCondition(builder_msg(
            OPERATION,
            format!("{} :: condition must be a non-empty array", keyword.replace(' ', "_")),
        )));
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    params.extend(values.iter().cloned());
    Ok(format!("{col} {keyword} ({placeholders})"))
}

fn between(
    col: &str,
    keyword: &str,
    name: &str,
    bounds: &[Value],
    params: &mut Vec<Value>,
) -> OrmResult<String> {
    if bounds.len() != 2 {
        return Err(OrmError::InvalidArity(builder_msg(
            OPERATION,
            format!("{name} :: condition must be an array of exactly 2 values, got {}", bounds.len()),
        )));
    }
    params.extend(bounds.iter().cloned());
    Ok(format!("{col} {keyword} ? AND ?"))
}

fn require_true(name: &str, flag: &Value) -> OrmResult<()> {
    if matches!(flag, Value::Bool(true)) {
        Ok(())
    } else {
        Err(OrmError::validation(builder_msg(
            OPERATION,
            format!("{name} :: value must be true"),
        )))
    }
}
