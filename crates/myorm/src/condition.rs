//! Condition trees for WHERE clauses.
//!
//! A [`Where`] node is an ordered list of entries. Each entry is a column test,
//! a nested `AND`/`OR` group, or a raw SQL fragment. Trees can be built with
//! the typed constructors or parsed from a JSON document:
//!
//! ```ignore
//! use myorm::{Op, Where};
//! use serde_json::json;
//!
//! let typed = Where::new()
//!     .op("age", Op::gt(18))
//!     .or(vec![Where::new().eq("status", "active"), Where::new().eq("status", "pending")]);
//!
//! let parsed = Where::from_json(&json!({
//!     "age": { ">": 18 },
//!     "OR": [{ "status": "active" }, { "status": "pending" }]
//! }))?;
//! ```
//!
//! Validation of operator payloads (non-empty IN lists, BETWEEN arity, ...) is
//! performed when the tree is compiled, which happens inside `where_()`.

use crate::error::{OrmError, OrmResult, builder_msg};
use crate::value::Value;
use serde_json::Value as Json;

/// Boolean connective of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// LIKE / NOT LIKE pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Like {
    /// Pattern used verbatim.
    Pattern(String),
    /// `%value%`
    Contains(String),
    /// `value%`
    StartsWith(String),
    /// `%value`
    EndsWith(String),
}

/// Operator applied to a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    Like(Like),
    NotLike(Like),
    Regexp(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    /// Must hold exactly two bounds.
    Between(Vec<Value>),
    /// Must hold exactly two bounds.
    NotBetween(Vec<Value>),
    /// Payload must be `true`.
    IsNull(Value),
    /// Payload must be `true`.
    IsNotNull(Value),
}

impl Op {
    pub fn eq(v: impl Into<Value>) -> Self {
        Op::Eq(v.into())
    }

    pub fn ne(v: impl Into<Value>) -> Self {
        Op::Ne(v.into())
    }

    pub fn lt(v: impl Into<Value>) -> Self {
        Op::Lt(v.into())
    }

    pub fn lte(v: impl Into<Value>) -> Self {
        Op::Lte(v.into())
    }

    pub fn gt(v: impl Into<Value>) -> Self {
        Op::Gt(v.into())
    }

    pub fn gte(v: impl Into<Value>) -> Self {
        Op::Gte(v.into())
    }

    pub fn like(pattern: impl Into<String>) -> Self {
        Op::Like(Like::Pattern(pattern.into()))
    }

    pub fn not_like(pattern: impl Into<String>) -> Self {
        Op::NotLike(Like::Pattern(pattern.into()))
    }

    pub fn contains(s: impl Into<String>) -> Self {
        Op::Like(Like::Contains(s.into()))
    }

    pub fn starts_with(s: impl Into<String>) -> Self {
        Op::Like(Like::StartsWith(s.into()))
    }

    pub fn ends_with(s: impl Into<String>) -> Self {
        Op::Like(Like::EndsWith(s.into()))
    }

    pub fn regexp(pattern: impl Into<String>) -> Self {
        Op::Regexp(Value::Text(pattern.into()))
    }

    pub fn in_list<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Op::In(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Op::NotIn(values.into_iter().map(Into::into).collect())
    }

    pub fn between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Op::Between(vec![from.into(), to.into()])
    }

    pub fn not_between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Op::NotBetween(vec![from.into(), to.into()])
    }

    pub fn is_null() -> Self {
        Op::IsNull(Value::Bool(true))
    }

    pub fn is_not_null() -> Self {
        Op::IsNotNull(Value::Bool(true))
    }

    /// Operator key as written in a condition document.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Eq(_) => "=",
            Op::Ne(_) => "!=",
            Op::Lt(_) => "<",
            Op::Lte(_) => "<=",
            Op::Gt(_) => ">",
            Op::Gte(_) => ">=",
            Op::Like(_) => "LIKE",
            Op::NotLike(_) => "NOT_LIKE",
            Op::Regexp(_) => "REGEXP",
            Op::In(_) => "IN",
            Op::NotIn(_) => "NOT_IN",
            Op::Between(_) => "BETWEEN",
            Op::NotBetween(_) => "NOT_BETWEEN",
            Op::IsNull(_) => "IS_NULL",
            Op::IsNotNull(_) => "IS_NOT_NULL",
        }
    }

    /// Parse one `operator: payload` entry of an operator object.
    pub fn from_json(name: &str, payload: &Json) -> OrmResult<Self> {
        let op = match name {
            "=" => Op::Eq(scalar(payload)),
            "!=" => Op::Ne(scalar(payload)),
            "<" => Op::Lt(scalar(payload)),
            "<=" => Op::Lte(scalar(payload)),
            ">" => Op::Gt(scalar(payload)),
            ">=" => Op::Gte(scalar(payload)),
            "LIKE" => Op::Like(Like::from_json(name, payload)?),
            "NOT_LIKE" => Op::NotLike(Like::from_json(name, payload)?),
            "REGEXP" => Op::Regexp(scalar(payload)),
            "IN" => Op::In(list(name, payload)?),
            "NOT_IN" => Op::NotIn(list(name, payload)?),
            "BETWEEN" => Op::Between(list(name, payload)?),
            "NOT_BETWEEN" => Op::NotBetween(list(name, payload)?),
            "IS_NULL" => Op::IsNull(scalar(payload)),
            "IS_NOT_NULL" => Op::IsNotNull(scalar(payload)),
            other => {
                return Err(OrmError::UnsupportedOperator(builder_msg(
                    "processConditions",
                    format!("Unsupported operator: {other}"),
                )));
            }
        };
        Ok(op)
    }
}

impl Like {
    fn from_json(operator: &str, payload: &Json) -> OrmResult<Self> {
        match payload {
            Json::String(s) => Ok(Like::Pattern(s.clone())),
            Json::Object(map) => {
                let present: Vec<&str> = ["contains", "startsWith", "endsWith"]
                    .into_iter()
                    .filter(|k| map.contains_key(*k))
                    .collect();
                if present.len() > 1 {
                    return Err(OrmError::ConflictingSentinel(builder_msg(
                        "processConditions",
                        format!(
                            "{operator} :: Only one of 'contains', 'startsWith', or 'endsWith' can be provided"
                        ),
                    )));
                }
                let text = |k: &str| match map.get(k) {
                    Some(Json::String(s)) => Ok(s.clone()),
                    Some(Json::Number(n)) => Ok(n.to_string()),
                    _ => Err(invalid_pattern(operator)),
                };
                match present.first().copied() {
                    Some("contains") => Ok(Like::Contains(text("contains")?)),
                    Some("startsWith") => Ok(Like::StartsWith(text("startsWith")?)),
                    Some("endsWith") => Ok(Like::EndsWith(text("endsWith")?)),
                    _ => Err(invalid_pattern(operator)),
                }
            }
            _ => Err(invalid_pattern(operator)),
        }
    }
}

pub(crate) fn invalid_pattern(operator: &str) -> OrmError {
    OrmError::validation(builder_msg(
        "processConditions",
        format!("{operator} :: Invalid pattern type"),
    ))
}

fn scalar(payload: &Json) -> Value {
    Value::from_json(payload.clone())
}

fn list(operator: &str, payload: &Json) -> OrmResult<Vec<Value>> {
    match payload {
        Json::Array(items) => Ok(items.iter().cloned().map(Value::from_json).collect()),
        _ => Err(OrmError::validation(builder_msg(
            "processConditions",
            format!("{operator} :: condition must be an array"),
        ))),
    }
}

/// What a column entry tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    /// Bare scalar: `col = ?`
    Value(Value),
    /// Bare list: `col IN (...)`
    List(Vec<Value>),
    /// Operator object, in declaration order.
    Ops(Vec<Op>),
}

/// One entry of a condition node.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Column { column: String, test: Test },
    And(Vec<Where>),
    Or(Vec<Where>),
    /// Trusted SQL with its own `?` params.
    Raw { sql: String, params: Vec<Value> },
}

/// A condition node: entries joined by the enclosing group's connective.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    entries: Vec<Cond>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Cond] {
        &self.entries
    }

    /// Append an entry.
    pub fn push(mut self, cond: Cond) -> Self {
        self.entries.push(cond);
        self
    }

    /// `column = value`
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Cond::Column {
            column: column.into(),
            test: Test::Value(value.into()),
        })
    }

    /// `column IN (values...)`
    pub fn in_list<T: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.push(Cond::Column {
            column: column.into(),
            test: Test::List(values.into_iter().map(Into::into).collect()),
        })
    }

    /// A single operator on a column.
    pub fn op(self, column: impl Into<String>, op: Op) -> Self {
        self.ops(column, vec![op])
    }

    /// Several operators on one column.
    pub fn ops(self, column: impl Into<String>, ops: Vec<Op>) -> Self {
        self.push(Cond::Column {
            column: column.into(),
            test: Test::Ops(ops),
        })
    }

    /// Nested AND group.
    pub fn and(self, children: Vec<Where>) -> Self {
        self.push(Cond::And(children))
    }

    /// Nested OR group.
    pub fn or(self, children: Vec<Where>) -> Self {
        self.push(Cond::Or(children))
    }

    /// Raw SQL fragment. The caller is responsible for its safety.
    pub fn raw<T: Into<Value>>(self, sql: impl Into<String>, params: impl IntoIterator<Item = T>) -> Self {
        self.push(Cond::Raw {
            sql: sql.into(),
            params: params.into_iter().map(Into::into).collect(),
        })
    }

    /// Parse a JSON condition document.
    ///
    /// Object keys are read in document order. `AND`, `OR` and `RAW` are
    /// reserved; every other key is a column.
    pub fn from_json(json: &Json) -> OrmResult<Self> {
        let Json::Object(map) = json else {
            return Err(OrmError::validation(builder_msg(
                "processConditions",
                "condition must be an object",
            )));
        };

        let mut node = Where::new();
        for (key, value) in map {
            let cond = match key.as_str() {
                "AND" | "OR" => {
                    let children = match value {
                        Json::Array(items) if items.is_empty() => {
                            return Err(OrmError::EmptyArrayCondition(builder_msg(
                                "processConditions",
                                format!("{key} :: condition must be a non-empty array"),
                            )));
                        }
                        Json::Array(items) => items
                            .iter()
                            .map(Where::from_json)
                            .collect::<OrmResult<Vec<_>>>()?,
                        _ => {
                            return Err(OrmError::validation(builder_msg(
                                "processConditions",
                                format!("{key} :: condition must be a non-empty array"),
                            )));
                        }
                    };
                    if key == "AND" {
                        Cond::And(children)
                    } else {
                        Cond::Or(children)
                    }
                }
                "RAW" => raw_from_json(value)?,
                column => {
                    let test = match value {
                        Json::Array(items) => {
                            Test::List(items.iter().cloned().map(Value::from_json).collect())
                        }
                        Json::Object(ops) => Test::Ops(
                            ops.iter()
                                .map(|(name, payload)| Op::from_json(name, payload))
                                .collect::<OrmResult<Vec<_>>>()?,
                        ),
                        scalar => Test::Value(Value::from_json(scalar.clone())),
                    };
                    Cond::Column {
                        column: column.to_string(),
                        test,
                    }
                }
            };
            node.entries.push(cond);
        }
        Ok(node)
    }
}

fn raw_from_json(value: &Json) -> OrmResult<Cond> {
    match value {
        Json::String(sql) => Ok(Cond::Raw {
            sql: sql.clone(),
            params: Vec::new(),
        }),
        Json::Object(map) => {
            let Some(Json::String(sql)) = map.get("sql") else {
                return Err(OrmError::validation(builder_msg(
                    "processConditions",
                    "RAW :: 'sql' must be a string",
                )));
            };
            let params = match map.get("params") {
                None | Some(Json::Null) => Vec::new(),
                Some(p) => list("RAW", p)?,
            };
            Ok(Cond::Raw {
                sql: sql.clone(),
                params,
            })
        }
        _ => Err(OrmError::validation(builder_msg(
            "processConditions",
            "RAW :: condition must be a string or {sql, params}",
        ))),
    }
}

/// Anything `where_()` accepts.
pub trait IntoCondition {
    fn into_condition(self) -> OrmResult<Where>;
}

impl IntoCondition for Where {
    fn into_condition(self) -> OrmResult<Where> {
        Ok(self)
    }
}

impl IntoCondition for Json {
    fn into_condition(self) -> OrmResult<Where> {
        Where::from_json(&self)
    }
}

impl IntoCondition for &Json {
    fn into_condition(self) -> OrmResult<Where> {
        Where::from_json(self)
    }
}
