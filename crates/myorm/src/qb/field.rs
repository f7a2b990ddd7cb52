//! Select-list descriptors.

use crate::error::{OrmError, OrmResult, builder_msg};
use crate::ident::{escape_id, is_dotted_wildcard};
use crate::qb::clause::Clause;
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::HashSet;

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// `*`
    Star,
    /// A column, or a `table.*` wildcard.
    Column(String),
    /// `?? AS ??`
    Alias { column: String, alias: String },
    /// Trusted SQL, optionally aliased, with its own params.
    Raw {
        sql: String,
        alias: Option<String>,
        params: Vec<Value>,
    },
}

impl Field {
    pub fn column(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == "*" { Field::Star } else { Field::Column(name) }
    }

    pub fn alias(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Field::Alias {
            column: column.into(),
            alias: alias.into(),
        }
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Field::Raw {
            sql: sql.into(),
            alias: None,
            params: Vec::new(),
        }
    }

    /// Attach an alias to a raw field. Other variants are returned unchanged.
    pub fn with_alias(self, name: impl Into<String>) -> Self {
        match self {
            Field::Raw { sql, params, .. } => Field::Raw {
                sql,
                alias: Some(name.into()),
                params,
            },
            other => other,
        }
    }

    /// Attach params to a raw field. Other variants are returned unchanged.
    pub fn with_params<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Self {
        match self {
            Field::Raw { sql, alias, .. } => Field::Raw {
                sql,
                alias,
                params: values.into_iter().map(Into::into).collect(),
            },
            other => other,
        }
    }

    fn identity(&self) -> String {
        match self {
            Field::Star => "*".to_string(),
            Field::Column(c) => format!("c:{c}"),
            Field::Alias { column, alias } => format!("a:{column}:{alias}"),
            Field::Raw { sql, alias: Some(a), .. } => format!("r:{sql} AS {a}"),
            Field::Raw { sql, alias: None, .. } => format!("r:{sql}"),
        }
    }

    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Field::Star => "*".to_string(),
            Field::Column(c) if is_dotted_wildcard(c) => c.clone(),
            Field::Column(c) => {
                params.push(Value::Text(c.clone()));
                "??".to_string()
            }
            Field::Alias { column, alias } => {
                params.push(Value::Text(column.clone()));
                params.push(Value::Text(alias.clone()));
                "?? AS ??".to_string()
            }
            Field::Raw { sql, alias, params: bound } => {
                params.extend(bound.iter().cloned());
                match alias {
                    Some(a) => format!("{sql} AS {}", escape_id(a)),
                    None => sql.clone(),
                }
            }
        }
    }
}

/// An ordered select list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, field: Field) -> Self {
        self.0.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON select list: `"*"`, `"col"`, `{"col": "alias"}`,
    /// `{"RAW": {"sql", "alias"?, "params"?}}`, or an array of those.
    pub fn from_json(json: &Json) -> OrmResult<Self> {
        let mut fields = Vec::new();
        match json {
            Json::Array(items) => {
                for item in items {
                    if item.is_array() {
                        return Err(invalid_field("nested arrays are not allowed"));
                    }
                    collect_json(item, &mut fields)?;
                }
            }
            other => collect_json(other, &mut fields)?,
        }
        Ok(Self(fields))
    }

    /// Drop entries whose identity was already seen, keeping first-seen order.
    fn dedup(&self) -> Vec<&Field> {
        let mut seen = HashSet::new();
        self.0.iter().filter(|f| seen.insert(f.identity())).collect()
    }

    /// Render as `SELECT ...`.
    pub(crate) fn to_clause(&self) -> Clause {
        let unique = self.dedup();
        if unique.is_empty() {
            return Clause::new("SELECT *", Vec::new());
        }
        let mut params = Vec::new();
        let parts: Vec<String> = unique.iter().map(|f| f.render(&mut params)).collect();
        Clause::new(format!("SELECT {}", parts.join(", ")), params)
    }
}

fn collect_json(json: &Json, out: &mut Vec<Field>) -> OrmResult<()> {
    match json {
        Json::String(s) => out.push(Field::column(s.as_str())),
        Json::Object(map) => {
            for (key, value) in map {
                if key == "RAW" {
                    out.push(raw_from_json(value)?);
                    continue;
                }
                match value {
                    Json::String(alias) => out.push(Field::alias(key.as_str(), alias.as_str())),
                    _ => return Err(invalid_field(format!("alias for {key} must be a string"))),
                }
            }
        }
        _ => return Err(invalid_field("expected a string or an object")),
    }
    Ok(())
}

fn raw_from_json(value: &Json) -> OrmResult<Field> {
    match value {
        Json::String(sql) => Ok(Field::raw(sql.as_str())),
        Json::Object(map) => {
            let Some(Json::String(sql)) = map.get("sql") else {
                return Err(invalid_field("RAW :: 'sql' must be a string"));
            };
            let alias = match map.get("alias") {
                None | Some(Json::Null) => None,
                Some(Json::String(a)) => Some(a.clone()),
                Some(_) => return Err(invalid_field("RAW :: 'alias' must be a string")),
            };
            let params = match map.get("params") {
                None | Some(Json::Null) => Vec::new(),
                Some(Json::Array(items)) => items.iter().cloned().map(Value::from_json).collect(),
                Some(_) => return Err(invalid_field("RAW :: 'params' must be an array")),
            };
            Ok(Field::Raw {
                sql: sql.clone(),
                alias,
                params,
            })
        }
        _ => Err(invalid_field("RAW :: expected a string or an object")),
    }
}

fn invalid_field(message: impl std::fmt::Display) -> OrmError {
    OrmError::validation(builder_msg("processFields", message))
}

impl From<Field> for Fields {
    fn from(field: Field) -> Self {
        Self(vec![field])
    }
}

impl From<Vec<Field>> for Fields {
    fn from(fields: Vec<Field>) -> Self {
        Self(fields)
    }
}

impl<const N: usize> From<[Field; N]> for Fields {
    fn from(fields: [Field; N]) -> Self {
        Self(fields.into())
    }
}

impl From<&str> for Fields {
    fn from(name: &str) -> Self {
        Field::column(name).into()
    }
}

impl From<String> for Fields {
    fn from(name: String) -> Self {
        Field::column(name).into()
    }
}

impl From<Vec<&str>> for Fields {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(Field::column).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Fields {
    fn from(names: [&str; N]) -> Self {
        Self(names.into_iter().map(Field::column).collect())
    }
}

impl From<Vec<String>> for Fields {
    fn from(names: Vec<String>) -> Self {
        Self(names.into_iter().map(Field::column).collect())
    }
}

impl From<(&str, &str)> for Fields {
    fn from((column, alias): (&str, &str)) -> Self {
        Field::alias(column, alias).into()
    }
}

/// Anything `select()` accepts.
pub trait IntoFields {
    fn into_fields(self) -> OrmResult<Fields>;
}

macro_rules! impl_into_fields {
    ($($t:ty),*) => {
        $(impl IntoFields for $t {
            fn into_fields(self) -> OrmResult<Fields> {
                Ok(self.into())
            }
        })*
    };
}

impl_into_fields!(Fields, Field, Vec<Field>, &str, String, Vec<&str>, Vec<String>, (&str, &str));

impl<const N: usize> IntoFields for [&str; N] {
    fn into_fields(self) -> OrmResult<Fields> {
        Ok(self.into())
    }
}

impl<const N: usize> IntoFields for [Field; N] {
    fn into_fields(self) -> OrmResult<Fields> {
        Ok(self.into())
    }
}

impl IntoFields for Json {
    fn into_fields(self) -> OrmResult<Fields> {
        Fields::from_json(&self)
    }
}
