//! The fluent statement builder.

use crate::condition::{BoolOp, IntoCondition};
use crate::error::{OrmError, OrmResult, builder_msg};
use crate::executor::{QueryOutput, SharedExecutor};
use crate::ident::split_table_alias;
use crate::qb::clause::{BuildOptions, BuiltQuery, Clause, ClauseKind, ClauseSet};
use crate::qb::compile::compile;
use crate::qb::field::IntoFields;
use crate::qb::mutation::{
    InsertOptions, IntoAssignments, IntoRows, UpdateOptions, insert_clause, prepare_update,
    set_clause,
};
use crate::qb::stage::{
    Assigned, Deleting, GroupByStep, Inserted, Limited, LimitStep, OrderByStep, Paged, Projected,
    Sourced, Stage, Updating, WhereStep,
};
use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

impl From<&str> for OrderBy {
    fn from(field: &str) -> Self {
        Self::asc(field)
    }
}

impl From<(&str, Direction)> for OrderBy {
    fn from((field, direction): (&str, Direction)) -> Self {
        Self {
            field: field.to_string(),
            direction,
        }
    }
}

fn require_table(operation: &str, table: &str) -> OrmResult<()> {
    if table.trim().is_empty() {
        return Err(OrmError::MissingTableName(builder_msg(
            operation,
            "Table name is required",
        )));
    }
    Ok(())
}

/// `?? [AS ??]` for a table reference.
fn table_ref(table: &str, alias: Option<&str>) -> (String, Vec<Value>) {
    let (name, alias) = split_table_alias(table, alias);
    match alias {
        Some(alias) => ("?? AS ??".to_string(), vec![Value::Text(name), Value::Text(alias)]),
        None => ("??".to_string(), vec![Value::Text(name)]),
    }
}

fn aggregate(func: &str, field: &str, alias: Option<&str>) -> Clause {
    let mut params = vec![Value::Text(field.to_string())];
    let mut sql = format!("SELECT {func}(??)");
    if let Some(alias) = alias.filter(|a| !a.is_empty()) {
        sql.push_str(" AS ??");
        params.push(Value::Text(alias.to_string()));
    }
    Clause::new(sql, params)
}

/// Entry point for building statements.
///
/// Every method starts a fresh [`Query`]; the builder itself only carries the
/// executor handed to each statement.
///
/// # Example
/// ```ignore
/// use myorm::SqlBuilder;
/// use serde_json::json;
///
/// let query = SqlBuilder::new()
///     .select(json!(["name", {"email": "email_address"}]))?
///     .from("users u")?
///     .where_(json!({"active": 1}))?
///     .build_query();
/// assert_eq!(query.sql, "SELECT ??, ?? AS ?? FROM ?? AS ?? WHERE active = ?");
/// ```
#[derive(Clone, Default)]
pub struct SqlBuilder {
    executor: Option<SharedExecutor>,
}

impl fmt::Debug for SqlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("has_executor", &self.executor.is_some())
            .finish()
    }
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose statements run through `executor`.
    pub fn with_executor(executor: SharedExecutor) -> Self {
        Self {
            executor: Some(executor),
        }
    }

    pub fn executor(&self) -> Option<&SharedExecutor> {
        self.executor.as_ref()
    }

    fn start<S: Stage>(&self, kind: ClauseKind, clause: Clause) -> Query<S> {
        let mut parts = ClauseSet::default();
        parts.set(kind, clause);
        Query {
            parts,
            executor: self.executor.clone(),
            _stage: PhantomData,
        }
    }

    /// `SELECT <fields>`. An empty list selects `*`.
    pub fn select(&self, fields: impl IntoFields) -> OrmResult<Query<Projected>> {
        let fields = fields.into_fields()?;
        Ok(self.start(ClauseKind::Select, fields.to_clause()))
    }

    /// `SELECT COUNT(*)` or `SELECT COUNT(??) [AS ??]`.
    pub fn count(&self, field: &str, alias: Option<&str>) -> Query<Projected> {
        let mut params = Vec::new();
        let mut sql = if field.is_empty() || field == "*" {
            "SELECT COUNT(*)".to_string()
        } else {
            params.push(Value::Text(field.to_string()));
            "SELECT COUNT(??)".to_string()
        };
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            sql.push_str(" AS ??");
            params.push(Value::Text(alias.to_string()));
        }
        self.start(ClauseKind::Count, Clause::new(sql, params))
    }

    pub fn max(&self, field: &str, alias: Option<&str>) -> Query<Projected> {
        self.start(ClauseKind::Select, aggregate("MAX", field, alias))
    }

    pub fn min(&self, field: &str, alias: Option<&str>) -> Query<Projected> {
        self.start(ClauseKind::Select, aggregate("MIN", field, alias))
    }

    pub fn avg(&self, field: &str, alias: Option<&str>) -> Query<Projected> {
        self.start(ClauseKind::Select, aggregate("AVG", field, alias))
    }

    pub fn sum(&self, field: &str, alias: Option<&str>) -> Query<Projected> {
        self.start(ClauseKind::Select, aggregate("SUM", field, alias))
    }

    /// `UPDATE ??`; follow with [`Query::set`].
    pub fn update(&self, table: &str) -> OrmResult<Query<Updating>> {
        require_table("update", table)?;
        Ok(self.start(
            ClauseKind::Update,
            Clause::new("UPDATE ??", vec![Value::Text(table.to_string())]),
        ))
    }

    /// `UPDATE ?? SET ...` in one step, applying `options` to the payload.
    pub fn update_with(
        &self,
        table: &str,
        values: impl IntoAssignments,
        options: &UpdateOptions,
    ) -> OrmResult<Query<Assigned>> {
        let query = self.update(table)?;
        let values = prepare_update(values.into_assignments()?, options)?;
        query.set(values)
    }

    /// `INSERT [IGNORE ]INTO ?? (...) VALUES ...`
    pub fn insert(
        &self,
        table: &str,
        rows: impl IntoRows,
        options: &InsertOptions,
    ) -> OrmResult<Query<Inserted>> {
        require_table("insert", table)?;
        let clause = insert_clause(table, rows.into_rows()?, options)?;
        Ok(self.start(ClauseKind::Insert, clause))
    }

    /// `DELETE FROM ??`
    pub fn delete_from(&self, table: &str) -> OrmResult<Query<Deleting>> {
        require_table("delete", table)?;
        Ok(self.start(
            ClauseKind::Delete,
            Clause::new("DELETE FROM ??", vec![Value::Text(table.to_string())]),
        ))
    }
}

/// A statement under construction at stage `S`.
///
/// The stage decides which calls come next. A legal chain:
///
/// ```
/// use myorm::{JoinType, SqlBuilder, Where};
///
/// let q = SqlBuilder::new()
///     .select("*").unwrap()
///     .from("t").unwrap()
///     .join(JoinType::Inner, "u", "u.id = t.uid").unwrap()
///     .where_(Where::new().eq("a", 1)).unwrap()
///     .limit(10)
///     .offset(20)
///     .build_query();
/// assert_eq!(q.sql, "SELECT * FROM ?? INNER JOIN ?? ON u.id = t.uid WHERE a = ? LIMIT ? OFFSET ?");
/// ```
///
/// `offset` needs a `limit` first:
///
/// ```compile_fail
/// use myorm::SqlBuilder;
///
/// let _ = SqlBuilder::new().select("*").unwrap().from("t").unwrap().offset(5);
/// ```
///
/// Joins must come before `where_`:
///
/// ```compile_fail
/// use myorm::{JoinType, SqlBuilder, Where};
///
/// let _ = SqlBuilder::new()
///     .select("*").unwrap()
///     .from("t").unwrap()
///     .where_(Where::new().eq("a", 1)).unwrap()
///     .join(JoinType::Inner, "u", "u.id = t.uid");
/// ```
///
/// An INSERT takes no `where_`:
///
/// ```compile_fail
/// use myorm::{SqlBuilder, Value, Where, row};
///
/// let _ = SqlBuilder::new()
///     .insert("t", row([("a", Value::from(1))]), &Default::default()).unwrap()
///     .where_(Where::new().eq("a", 1));
/// ```
///
/// `set` is called once:
///
/// ```compile_fail
/// use myorm::{SqlBuilder, UpdateValues};
///
/// let _ = SqlBuilder::new()
///     .update("t").unwrap()
///     .set(UpdateValues::new().set("a", 1)).unwrap()
///     .set(UpdateValues::new().set("b", 2));
/// ```
pub struct Query<S> {
    parts: ClauseSet,
    executor: Option<SharedExecutor>,
    _stage: PhantomData<S>,
}

impl<S> fmt::Debug for Query<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("stage", &std::any::type_name::<S>())
            .field("parts", &self.parts)
            .field("has_executor", &self.executor.is_some())
            .finish()
    }
}

impl<S: Stage> Query<S> {
    fn advance<T: Stage>(self) -> Query<T> {
        Query {
            parts: self.parts,
            executor: self.executor,
            _stage: PhantomData,
        }
    }

    /// Replace the executor for this statement.
    pub fn with_executor(mut self, executor: SharedExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Assemble the statement.
    pub fn build_query(&self) -> BuiltQuery {
        self.parts.assemble()
    }

    pub fn build_query_with(&self, options: BuildOptions) -> BuiltQuery {
        self.parts.assemble().apply(options)
    }

    /// Run the statement through the configured executor and return its output
    /// unchanged.
    pub async fn execute_query(self) -> OrmResult<QueryOutput> {
        let executor = self.executor.clone().ok_or_else(|| {
            OrmError::configuration(builder_msg(
                "executeQuery",
                "No query executor configured",
            ))
        })?;
        let BuiltQuery { sql, params } = self.parts.assemble();
        executor.execute(&sql, &params).await
    }
}

impl Query<Projected> {
    /// `FROM ?? [AS ??]`. `"users u"` is split into table and alias.
    pub fn from(self, table: &str) -> OrmResult<Query<Sourced>> {
        self.from_table(table, None)
    }

    pub fn from_as(self, table: &str, alias: &str) -> OrmResult<Query<Sourced>> {
        self.from_table(table, Some(alias))
    }

    fn from_table(mut self, table: &str, alias: Option<&str>) -> OrmResult<Query<Sourced>> {
        require_table("from", table)?;
        let (sql, params) = table_ref(table, alias);
        self.parts
            .set(ClauseKind::From, Clause::new(format!("FROM {sql}"), params));
        Ok(self.advance())
    }
}

impl Query<Sourced> {
    /// `<TYPE> JOIN ?? [AS ??] ON <on>`. The ON text is embedded verbatim.
    pub fn join(self, kind: JoinType, table: &str, on: &str) -> OrmResult<Self> {
        self.join_table(kind, table, None, on)
    }

    pub fn join_as(self, kind: JoinType, table: &str, alias: &str, on: &str) -> OrmResult<Self> {
        self.join_table(kind, table, Some(alias), on)
    }

    fn join_table(
        mut self,
        kind: JoinType,
        table: &str,
        alias: Option<&str>,
        on: &str,
    ) -> OrmResult<Self> {
        require_table("join", table)?;
        let (sql, params) = table_ref(table, alias);
        self.parts.append(
            ClauseKind::Join,
            Clause::new(format!("{} JOIN {sql} ON {on}", kind.as_str()), params),
        );
        Ok(self)
    }
}

impl<S: WhereStep> Query<S> {
    /// `WHERE <condition>`.
    ///
    /// On a SELECT an empty condition adds nothing. On UPDATE and DELETE it
    /// fails with [`OrmError::EmptyPayload`]; leave out `where_` entirely to
    /// mutate every row.
    pub fn where_(mut self, condition: impl IntoCondition) -> OrmResult<Query<S::Next>> {
        let tree = condition.into_condition()?;
        let (clause, params) = compile(&tree, BoolOp::And)?;
        if clause.is_empty() {
            if S::GUARDED {
                return Err(OrmError::EmptyPayload(builder_msg(
                    "where",
                    "Condition cannot be empty for UPDATE or DELETE",
                )));
            }
        } else {
            self.parts
                .set(ClauseKind::Where, Clause::new(format!("WHERE {clause}"), params));
        }
        Ok(self.advance())
    }
}

impl<S: GroupByStep> Query<S> {
    /// `GROUP BY ??, ...`. An empty list adds nothing.
    pub fn group_by<I, T>(mut self, fields: I) -> Query<S::Next>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let params: Vec<Value> = fields.into_iter().map(|f| Value::Text(f.into())).collect();
        if !params.is_empty() {
            let sql = format!("GROUP BY {}", vec!["??"; params.len()].join(", "));
            self.parts.set(ClauseKind::GroupBy, Clause::new(sql, params));
        }
        self.advance()
    }
}

impl<S: OrderByStep> Query<S> {
    /// `ORDER BY ?? ASC, ?? DESC, ...`. An empty list adds nothing.
    pub fn order_by<I, T>(mut self, fields: I) -> Query<S::Next>
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderBy>,
    {
        let fields: Vec<OrderBy> = fields.into_iter().map(Into::into).collect();
        if !fields.is_empty() {
            let parts: Vec<String> = fields
                .iter()
                .map(|o| format!("?? {}", o.direction.as_str()))
                .collect();
            let params = fields.into_iter().map(|o| Value::Text(o.field)).collect();
            self.parts.set(
                ClauseKind::OrderBy,
                Clause::new(format!("ORDER BY {}", parts.join(", ")), params),
            );
        }
        self.advance()
    }
}

impl<S: LimitStep> Query<S> {
    /// `LIMIT ?`. `None` adds nothing.
    pub fn limit(mut self, limit: impl Into<Option<u64>>) -> Query<S::Next> {
        if let Some(n) = limit.into() {
            self.parts
                .set(ClauseKind::Limit, Clause::new("LIMIT ?", vec![Value::UInt(n)]));
        }
        self.advance()
    }
}

impl Query<Limited> {
    /// `OFFSET ?`. `None` adds nothing.
    pub fn offset(mut self, offset: impl Into<Option<u64>>) -> Query<Paged> {
        if let Some(n) = offset.into() {
            self.parts
                .set(ClauseKind::Offset, Clause::new("OFFSET ?", vec![Value::UInt(n)]));
        }
        self.advance()
    }
}

impl Query<Updating> {
    /// `SET ?? = ?, ...`. Increment/decrement entries render as `?? = ?? ± ?`.
    pub fn set(mut self, values: impl IntoAssignments) -> OrmResult<Query<Assigned>> {
        let clause = set_clause(&values.into_assignments()?)?;
        self.parts.set(ClauseKind::Set, clause);
        Ok(self.advance())
    }
}
