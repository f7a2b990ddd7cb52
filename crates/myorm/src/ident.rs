//! Identifier handling.
//!
//! Table, column and alias names normally travel as `??` parameters. Two
//! places embed them as literal text instead:
//!
//! - condition columns, after stripping every character outside `[A-Za-z0-9_.]`
//! - dotted wildcards such as `u.*`, which must match `^[A-Za-z_]\w*\.\*$`

use regex::Regex;
use std::sync::OnceLock;

fn unsafe_ident_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.]").expect("invalid built-in identifier regex"))
}

fn dotted_wildcard() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\.\*$").expect("invalid built-in wildcard regex")
    })
}

/// Strip every character outside `[A-Za-z0-9_.]` from a column name.
pub fn sanitize_column(column: &str) -> String {
    unsafe_ident_chars().replace_all(column, "").into_owned()
}

/// Check for a `table.*` wildcard.
pub fn is_dotted_wildcard(field: &str) -> bool {
    dotted_wildcard().is_match(field)
}

/// Split `"users u"` into `("users", Some("u"))`.
///
/// An explicit alias wins over one embedded in the table string; in that case
/// the table string is used as-is.
pub fn split_table_alias(table: &str, alias: Option<&str>) -> (String, Option<String>) {
    if let Some(alias) = alias.filter(|a| !a.is_empty()) {
        return (table.to_string(), Some(alias.to_string()));
    }
    let mut parts = table.split(' ');
    let name = parts.next().unwrap_or_default().to_string();
    let extracted = parts.next().filter(|a| !a.is_empty()).map(str::to_string);
    (name, extracted)
}

/// Backtick-quote an identifier, quoting each dotted part separately.
///
/// `` a.b`c `` becomes `` `a`.`b``c` ``.
pub fn escape_id(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push('`');
    for ch in ident.chars() {
        match ch {
            '`' => out.push_str("``"),
            '.' => out.push_str("`.`"),
            c => out.push(c),
        }
    }
    out.push('`');
    out
}
