//! Inline parameters into a statement for display.
//!
//! The output is meant for logs and debugging. Execution always goes through
//! the positional `(sql, params)` pair.

use crate::ident::escape_id;
use crate::value::Value;

/// Substitute `??` and `?` placeholders with their parameters.
///
/// - `??` takes the next param and renders it as a backtick-quoted identifier.
/// - `?` takes the next param and renders it as an escaped literal.
/// - Runs of three or more `?` are copied verbatim.
/// - Placeholders past the end of `params` are left in place.
///
/// # Example
/// ```ignore
/// let sql = myorm::format_query("SELECT ?? FROM ?? WHERE id = ?", &["name".into(), "users".into(), 1.into()]);
/// assert_eq!(sql, "SELECT `name` FROM `users` WHERE id = 1");
/// ```
pub fn format_query(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut values = params.iter();
    let mut rest = sql;

    while let Some(start) = rest.find('?') {
        out.push_str(&rest[..start]);
        let run = rest[start..].bytes().take_while(|b| *b == b'?').count();
        let marks = &rest[start..start + run];
        rest = &rest[start + run..];

        if run > 2 {
            out.push_str(marks);
            continue;
        }
        match values.next() {
            Some(value) if run == 2 => out.push_str(&escape_id(&ident_text(value))),
            Some(value) => out.push_str(&escape_literal(value)),
            None => {
                out.push_str(marks);
                out.push_str(rest);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}

fn ident_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => escape_literal(other),
    }
}

/// Render a value as a MySQL literal.
pub fn escape_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => quote_string(s),
        Value::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("X'{hex}'")
        }
        Value::DateTime(dt) => quote_string(&dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        Value::Json(json) => quote_string(&json.to_string()),
    }
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
