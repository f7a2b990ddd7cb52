//! INSERT and UPDATE payload handling.

use crate::error::{OrmError, OrmResult, builder_msg};
use crate::qb::clause::Clause;
use crate::value::{Row, Value};
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

/// Right-hand side of a `SET` assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Assign {
    /// `col = ?`
    Value(Value),
    /// `col = col + ?`
    Increment(Value),
    /// `col = col - ?`
    Decrement(Value),
}

/// Ordered column → assignment map for UPDATE statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateValues {
    fields: IndexMap<String, Assign>,
}

impl UpdateValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), Assign::Value(value.into()));
        self
    }

    /// `column = column + delta`
    pub fn increment(mut self, column: impl Into<String>, delta: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), Assign::Increment(delta.into()));
        self
    }

    /// `column = column - delta`
    pub fn decrement(mut self, column: impl Into<String>, delta: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), Assign::Decrement(delta.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn get(&self, column: &str) -> Option<&Assign> {
        self.fields.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Assign)> {
        self.fields.iter()
    }

    pub(crate) fn insert(&mut self, column: impl Into<String>, assign: Assign) {
        self.fields.insert(column.into(), assign);
    }

    pub(crate) fn remove(&mut self, column: &str) -> Option<Assign> {
        self.fields.shift_remove(column)
    }
}

impl From<Row> for UpdateValues {
    fn from(row: Row) -> Self {
        Self {
            fields: row.into_iter().map(|(k, v)| (k, Assign::Value(v))).collect(),
        }
    }
}

/// Anything `set()` and `update_with()` accept.
pub trait IntoAssignments {
    fn into_assignments(self) -> OrmResult<UpdateValues>;
}

impl IntoAssignments for UpdateValues {
    fn into_assignments(self) -> OrmResult<UpdateValues> {
        Ok(self)
    }
}

impl IntoAssignments for Row {
    fn into_assignments(self) -> OrmResult<UpdateValues> {
        Ok(self.into())
    }
}

impl IntoAssignments for Json {
    fn into_assignments(self) -> OrmResult<UpdateValues> {
        let Json::Object(map) = self else {
            return Err(OrmError::validation(builder_msg(
                "Set",
                "Values must be an object",
            )));
        };

        let mut values = UpdateValues::new();
        for (column, value) in map {
            let assign = match value {
                Json::Object(sentinel) => {
                    match (sentinel.get("increment").cloned(), sentinel.get("decrement").cloned()) {
                        (Some(_), Some(_)) => {
                            return Err(OrmError::ConflictingSentinel(builder_msg(
                                "Set",
                                format!("Both increment and decrement provided for field {column}"),
                            )));
                        }
                        (Some(delta), None) => Assign::Increment(Value::from_json(delta)),
                        (None, Some(delta)) => Assign::Decrement(Value::from_json(delta)),
                        (None, None) => Assign::Value(Value::Json(Json::Object(sentinel))),
                    }
                }
                other => Assign::Value(Value::from_json(other)),
            };
            values.insert(column, assign);
        }
        Ok(values)
    }
}

/// A timestamp column value: fixed, or computed when the statement is built.
#[derive(Clone)]
pub enum Timestamp {
    Fixed(Value),
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Timestamp {
    pub fn fixed(value: impl Into<Value>) -> Self {
        Timestamp::Fixed(value.into())
    }

    pub fn computed(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Timestamp::Computed(Arc::new(f))
    }

    /// Current unix time in seconds.
    pub fn unix_now() -> Self {
        Self::computed(|| Value::Int(chrono::Utc::now().timestamp()))
    }

    pub fn resolve(&self) -> Value {
        match self {
            Timestamp::Fixed(v) => v.clone(),
            Timestamp::Computed(f) => f(),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::unix_now()
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Timestamp::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Options for UPDATE statements.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Write `utime_field` on every update.
    pub enable_timestamps: bool,
    pub utime_field: String,
    pub utime_value: Timestamp,
    /// Stripped from the payload when present.
    pub primary_key: Option<String>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            enable_timestamps: false,
            utime_field: "utime".to_string(),
            utime_value: Timestamp::default(),
            primary_key: None,
        }
    }
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.enable_timestamps = enabled;
        self
    }

    pub fn with_utime_field(mut self, field: impl Into<String>) -> Self {
        self.utime_field = field.into();
        self
    }

    pub fn with_utime_value(mut self, value: Timestamp) -> Self {
        self.utime_value = value;
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }
}

/// Options for INSERT statements.
#[derive(Debug, Clone)]
pub struct InsertOptions {
    /// Render `INSERT IGNORE`.
    pub insert_ignore: bool,
    /// Columns written by `ON DUPLICATE KEY UPDATE`.
    pub on_duplicate_key_update: Option<Row>,
    /// Add creation/update timestamps to rows that lack them.
    pub enable_timestamps: bool,
    pub ctime_field: String,
    pub utime_field: String,
    pub ctime_value: Timestamp,
    pub utime_value: Timestamp,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            insert_ignore: false,
            on_duplicate_key_update: None,
            enable_timestamps: false,
            ctime_field: "ctime".to_string(),
            utime_field: "utime".to_string(),
            ctime_value: Timestamp::default(),
            utime_value: Timestamp::default(),
        }
    }
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_ignore(mut self, ignore: bool) -> Self {
        self.insert_ignore = ignore;
        self
    }

    pub fn with_on_duplicate_key_update(mut self, row: Row) -> Self {
        self.on_duplicate_key_update = Some(row);
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.enable_timestamps = enabled;
        self
    }

    pub fn with_ctime_field(mut self, field: impl Into<String>) -> Self {
        self.ctime_field = field.into();
        self
    }

    pub fn with_utime_field(mut self, field: impl Into<String>) -> Self {
        self.utime_field = field.into();
        self
    }

    pub fn with_ctime_value(mut self, value: Timestamp) -> Self {
        self.ctime_value = value;
        self
    }

    pub fn with_utime_value(mut self, value: Timestamp) -> Self {
        self.utime_value = value;
        self
    }
}

/// Anything `insert()` accepts: one row or several.
pub trait IntoRows {
    fn into_rows(self) -> OrmResult<Vec<Row>>;
}

impl IntoRows for Row {
    fn into_rows(self) -> OrmResult<Vec<Row>> {
        Ok(vec![self])
    }
}

impl IntoRows for Vec<Row> {
    fn into_rows(self) -> OrmResult<Vec<Row>> {
        Ok(self)
    }
}

impl<const N: usize> IntoRows for [Row; N] {
    fn into_rows(self) -> OrmResult<Vec<Row>> {
        Ok(self.into())
    }
}

impl IntoRows for Json {
    fn into_rows(self) -> OrmResult<Vec<Row>> {
        match self {
            Json::Object(_) => Ok(vec![row_from_json(self)?]),
            Json::Array(items) => items.into_iter().map(row_from_json).collect(),
            _ => Err(OrmError::validation(builder_msg(
                "Insert",
                "Values must be an object or an array of objects",
            ))),
        }
    }
}

fn row_from_json(json: Json) -> OrmResult<Row> {
    match json {
        Json::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(v)))
            .collect()),
        _ => Err(OrmError::validation(builder_msg(
            "Insert",
            "Each row must be an object",
        ))),
    }
}

/// Apply timestamp injection and primary-key stripping to an UPDATE payload.
pub(crate) fn prepare_update(
    mut values: UpdateValues,
    options: &UpdateOptions,
) -> OrmResult<UpdateValues> {
    if values.is_empty() {
        return Err(OrmError::EmptyPayload(builder_msg(
            "Update",
            "Data cannot be empty",
        )));
    }
    if options.enable_timestamps {
        values.insert(
            options.utime_field.clone(),
            Assign::Value(options.utime_value.resolve()),
        );
    }
    if let Some(pk) = &options.primary_key {
        values.remove(pk);
    }
    if values.is_empty() {
        return Err(OrmError::EmptyPayload(builder_msg(
            "Update",
            "Data cannot be empty after removing the primary key",
        )));
    }
    Ok(values)
}

/// `SET ?? = ?, ?? = ?? + ?, ...`
pub(crate) fn set_clause(values: &UpdateValues) -> OrmResult<Clause> {
    if values.is_empty() {
        return Err(OrmError::EmptyPayload(builder_msg(
            "Set",
            "Values cannot be empty",
        )));
    }

    let mut parts = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len() * 2);
    for (column, assign) in values.iter() {
        let col = Value::Text(column.clone());
        match assign {
            Assign::Value(v) => {
                parts.push("?? = ?");
                params.extend([col, v.clone()]);
            }
            Assign::Increment(delta) => {
                parts.push("?? = ?? + ?");
                params.extend([col.clone(), col, delta.clone()]);
            }
            Assign::Decrement(delta) => {
                parts.push("?? = ?? - ?");
                params.extend([col.clone(), col, delta.clone()]);
            }
        }
    }
    Ok(Clause::new(format!("SET {}", parts.join(", ")), params))
}

/// `INSERT [IGNORE ]INTO ?? (...) VALUES (...), ... [ON DUPLICATE KEY UPDATE ...]`
pub(crate) fn insert_clause(
    table: &str,
    mut rows: Vec<Row>,
    options: &InsertOptions,
) -> OrmResult<Clause> {
    if rows.is_empty() || rows.iter().any(Row::is_empty) {
        return Err(OrmError::EmptyPayload(builder_msg(
            "Insert",
            "Values cannot be empty",
        )));
    }

    if options.enable_timestamps {
        for row in &mut rows {
            if !row.contains_key(&options.ctime_field) {
                row.insert(options.ctime_field.clone(), options.ctime_value.resolve());
            }
            if !row.contains_key(&options.utime_field) {
                row.insert(options.utime_field.clone(), options.utime_value.resolve());
            }
        }
    }

    let columns: Vec<String> = rows[0].keys().cloned().collect();
    let mut params: Vec<Value> = Vec::with_capacity(1 + columns.len() * (rows.len() + 1));
    params.push(Value::Text(table.to_string()));
    params.extend(columns.iter().cloned().map(Value::Text));

    for (idx, row) in rows.iter_mut().enumerate() {
        if row.len() != columns.len() {
            return Err(row_shape_error(idx));
        }
        for column in &columns {
            match row.swap_remove(column) {
                Some(v) => params.push(v),
                None => return Err(row_shape_error(idx)),
            }
        }
    }

    let group = format!("({})", vec!["?"; columns.len()].join(", "));
    let mut sql = format!(
        "INSERT {}INTO ?? ({}) VALUES {}",
        if options.insert_ignore { "IGNORE " } else { "" },
        vec!["??"; columns.len()].join(", "),
        vec![group.as_str(); rows.len()].join(", "),
    );

    if let Some(update) = options.on_duplicate_key_update.as_ref().filter(|r| !r.is_empty()) {
        let assignments = vec!["?? = ?"; update.len()].join(", ");
        sql.push_str(&format!(" ON DUPLICATE KEY UPDATE {assignments}"));
        for (column, value) in update {
            params.push(Value::Text(column.clone()));
            params.push(value.clone());
        }
    }

    Ok(Clause::new(sql, params))
}

fn row_shape_error(idx: usize) -> OrmError {
    OrmError::validation(builder_msg(
        "Insert",
        format!("Row {idx} does not match the columns of the first row"),
    ))
}
