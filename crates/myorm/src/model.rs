//! Per-table convenience layer.
//!
//! A [`TableModel`] binds a table name, primary key, known columns and the
//! central field names, then delegates every operation to [`SqlBuilder`]. Each
//! method returns the statement at its final stage so the caller can inspect
//! it with `build_query()` or run it with `execute_query()`.
//!
//! ```ignore
//! let users = TableModel::new(TableModelConfig::new("users", "id", ["id", "name", "is_deleted"]), Some(exec))?;
//! let row = users
//!     .find_one(Fields::new(), Where::new().eq("id", 7), vec![])?
//!     .execute_query()
//!     .await?;
//! ```

mod config;

pub use config::{CentralFields, ModelsFile, TableModelConfig};

use crate::condition::{IntoCondition, Where};
use crate::error::{OrmError, OrmResult};
use crate::executor::SharedExecutor;
use crate::qb::{
    Fields, Inserted, InsertOptions, IntoAssignments, IntoFields, IntoRows, Limited,
    MutationFiltered, MutationLimited, OrderBy, Paged, Query, Sourced, SqlBuilder, UpdateOptions,
    UpdateValues,
};
use crate::value::Value;

/// Options for soft deletes.
#[derive(Debug, Clone, Default)]
pub struct SoftDeleteOptions {
    /// Column to flag. Defaults to the central `is_deleted` field.
    pub delete_field: Option<String>,
    pub update: UpdateOptions,
}

impl SoftDeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_field(mut self, field: impl Into<String>) -> Self {
        self.delete_field = Some(field.into());
        self
    }

    pub fn with_update_options(mut self, options: UpdateOptions) -> Self {
        self.update = options;
        self
    }
}

/// Arguments for [`TableModel::find_all`].
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    pub fields: Fields,
    /// `Some` must hold a non-empty condition.
    pub condition: Option<Where>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    /// Ignored without a limit.
    pub offset: Option<u64>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn with_condition(mut self, condition: Where) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Statement factory bound to one table.
#[derive(Debug, Clone)]
pub struct TableModel {
    config: TableModelConfig,
    builder: SqlBuilder,
}

impl TableModel {
    /// Validate `config` and bind it to an optional executor.
    pub fn new(config: TableModelConfig, executor: Option<SharedExecutor>) -> OrmResult<Self> {
        if config.table_name.trim().is_empty() {
            return Err(OrmError::MissingTableName(
                "[Table :: ] :: Table name is required".to_string(),
            ));
        }
        if config.primary_key.trim().is_empty() {
            return Err(OrmError::validation(format!(
                "[Table :: {}] :: Primary key is required",
                config.table_name
            )));
        }
        if config.columns.is_empty() {
            return Err(OrmError::validation(format!(
                "[Table :: {}] :: Table columns are required",
                config.table_name
            )));
        }

        let builder = match executor {
            Some(exec) => SqlBuilder::with_executor(exec),
            None => SqlBuilder::new(),
        };
        Ok(Self { config, builder })
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub fn primary_key(&self) -> &str {
        &self.config.primary_key
    }

    pub fn columns(&self) -> &[String] {
        &self.config.columns
    }

    pub fn central_fields(&self) -> &CentralFields {
        &self.config.central_fields
    }

    /// A builder sharing this model's executor.
    pub fn builder(&self) -> &SqlBuilder {
        &self.builder
    }

    fn msg(&self, message: impl std::fmt::Display) -> String {
        format!("[Table :: {}] :: {message}", self.config.table_name)
    }

    /// Update options with the central `utime` field and this table's primary key.
    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions::new()
            .with_utime_field(self.config.central_fields.utime_field.clone())
            .with_primary_key(self.config.primary_key.clone())
    }

    /// Insert options with the central `ctime`/`utime` fields.
    pub fn insert_options(&self) -> InsertOptions {
        InsertOptions::new()
            .with_ctime_field(self.config.central_fields.ctime_field.clone())
            .with_utime_field(self.config.central_fields.utime_field.clone())
    }

    fn require_condition(&self, operation: &str, condition: impl IntoCondition) -> OrmResult<Where> {
        let condition = condition.into_condition()?;
        if condition.is_empty() {
            return Err(OrmError::EmptyPayload(
                self.msg(format!("{operation} :: Where condition cannot be empty")),
            ));
        }
        Ok(condition)
    }

    fn require_data(&self, operation: &str, data: impl IntoAssignments) -> OrmResult<UpdateValues> {
        let data = data.into_assignments()?;
        if data.is_empty() {
            return Err(OrmError::EmptyPayload(
                self.msg(format!("{operation} :: Data cannot be empty")),
            ));
        }
        Ok(data)
    }

    fn with_primary_key(&self, options: &UpdateOptions) -> UpdateOptions {
        options.clone().with_primary_key(self.config.primary_key.clone())
    }

    /// `SELECT <fields> FROM <table>`
    pub fn select(&self, fields: impl IntoFields) -> OrmResult<Query<Sourced>> {
        self.builder.select(fields)?.from(&self.config.table_name)
    }

    /// `SELECT COUNT(...) FROM <table>`
    pub fn count(&self, field: &str, alias: Option<&str>) -> OrmResult<Query<Sourced>> {
        self.builder.count(field, alias).from(&self.config.table_name)
    }

    /// First row matching a required condition.
    pub fn find_one(
        &self,
        fields: impl IntoFields,
        condition: impl IntoCondition,
        order_by: Vec<OrderBy>,
    ) -> OrmResult<Query<Limited>> {
        let condition = self.require_condition("FindOne", condition)?;
        Ok(self
            .select(fields)?
            .where_(condition)?
            .order_by(order_by)
            .limit(1))
    }

    pub fn find_all(&self, args: FindAll) -> OrmResult<Query<Paged>> {
        let condition = match args.condition {
            Some(c) => self.require_condition("FindAll", c)?,
            None => Where::new(),
        };
        Ok(self
            .select(args.fields)?
            .where_(condition)?
            .order_by(args.order_by)
            .limit(args.limit)
            .offset(args.limit.and(args.offset)))
    }

    /// Update at most one row.
    pub fn update_one(
        &self,
        data: impl IntoAssignments,
        condition: impl IntoCondition,
        options: &UpdateOptions,
    ) -> OrmResult<Query<MutationLimited>> {
        Ok(self
            .update_matching("UpdateOne", data, condition, options)?
            .limit(1))
    }

    /// Update every row matching a required condition.
    pub fn update_all(
        &self,
        data: impl IntoAssignments,
        condition: impl IntoCondition,
        options: &UpdateOptions,
    ) -> OrmResult<Query<MutationFiltered>> {
        self.update_matching("UpdateAll", data, condition, options)
    }

    fn update_matching(
        &self,
        operation: &str,
        data: impl IntoAssignments,
        condition: impl IntoCondition,
        options: &UpdateOptions,
    ) -> OrmResult<Query<MutationFiltered>> {
        let condition = self.require_condition(operation, condition)?;
        let data = self.require_data(operation, data)?;
        self.builder
            .update_with(&self.config.table_name, data, &self.with_primary_key(options))?
            .where_(condition)
    }

    /// Insert one or more rows. Keys that are not table columns are dropped.
    pub fn insert_record(
        &self,
        rows: impl IntoRows,
        options: &InsertOptions,
    ) -> OrmResult<Query<Inserted>> {
        let mut rows = rows.into_rows()?;
        if rows.is_empty() || rows.iter().all(|r| r.is_empty()) {
            return Err(OrmError::EmptyPayload(self.msg("Create :: Data cannot be empty")));
        }

        for (idx, row) in rows.iter_mut().enumerate() {
            let mut removed = Vec::new();
            row.retain(|key, _| {
                let known = self.config.columns.iter().any(|c| c == key);
                if !known {
                    removed.push(key.clone());
                }
                known
            });
            if !removed.is_empty() {
                tracing::warn!(
                    table = %self.config.table_name,
                    removed = %removed.join(", "),
                    row = idx,
                    "{}",
                    self.msg(format!("Removed unknown fields: {} from data[{idx}]", removed.join(", ")))
                );
            }
        }

        self.builder.insert(&self.config.table_name, rows, options)
    }

    /// Delete at most one row.
    pub fn remove_one(
        &self,
        condition: impl IntoCondition,
        order_by: Vec<OrderBy>,
    ) -> OrmResult<Query<MutationLimited>> {
        let condition = self.require_condition("RemoveOne", condition)?;
        Ok(self
            .builder
            .delete_from(&self.config.table_name)?
            .where_(condition)?
            .order_by(order_by)
            .limit(1))
    }

    /// Delete every row matching a required condition.
    pub fn remove(&self, condition: impl IntoCondition) -> OrmResult<Query<MutationFiltered>> {
        let condition = self.require_condition("Remove", condition)?;
        self.builder
            .delete_from(&self.config.table_name)?
            .where_(condition)
    }

    /// Set a single column on every matching row.
    pub fn patch_single_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        condition: impl IntoCondition,
        options: &UpdateOptions,
    ) -> OrmResult<Query<MutationFiltered>> {
        if field.trim().is_empty() {
            return Err(OrmError::validation(
                self.msg("PatchSingleField :: Patch field is required"),
            ));
        }
        let data = UpdateValues::new().set(field, value);
        self.update_matching("PatchSingleField", data, condition, options)
    }

    /// Flag at most one row as deleted.
    pub fn soft_delete_one(
        &self,
        condition: impl IntoCondition,
        value: impl Into<Value>,
        options: &SoftDeleteOptions,
    ) -> OrmResult<Query<MutationLimited>> {
        Ok(self
            .soft_delete_matching("SoftDeleteOne", condition, value, options)?
            .limit(1))
    }

    /// Flag every matching row as deleted.
    pub fn soft_delete(
        &self,
        condition: impl IntoCondition,
        value: impl Into<Value>,
        options: &SoftDeleteOptions,
    ) -> OrmResult<Query<MutationFiltered>> {
        self.soft_delete_matching("SoftDelete", condition, value, options)
    }

    fn soft_delete_matching(
        &self,
        operation: &str,
        condition: impl IntoCondition,
        value: impl Into<Value>,
        options: &SoftDeleteOptions,
    ) -> OrmResult<Query<MutationFiltered>> {
        let field = options
            .delete_field
            .clone()
            .unwrap_or_else(|| self.config.central_fields.is_deleted_field.clone());
        let data = UpdateValues::new().set(field, value);
        self.update_matching(operation, data, condition, &options.update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> TableModel {
        TableModel::new(
            TableModelConfig::new("users", "id", ["id", "name", "email", "is_deleted", "utime"]),
            None,
        )
        .unwrap()
    }

    #[test]
    fn config_is_validated() {
        let err = TableModel::new(TableModelConfig::new("", "id", ["id"]), None).unwrap_err();
        assert!(matches!(err, OrmError::MissingTableName(_)));

        let err = TableModel::new(TableModelConfig::new("t", "", ["id"]), None).unwrap_err();
        assert!(err.is_validation());

        let err =
            TableModel::new(TableModelConfig::new("t", "id", Vec::<String>::new()), None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn find_one_adds_limit() {
        let q = users()
            .find_one("name", json!({"id": 1}), vec![OrderBy::desc("id")])
            .unwrap()
            .build_query();
        assert_eq!(q.sql, "SELECT ?? FROM ?? WHERE id = ? ORDER BY ?? DESC LIMIT ?");
        assert_eq!(
            q.params,
            vec!["name".into(), "users".into(), 1.into(), "id".into(), Value::UInt(1)]
        );
    }

    #[test]
    fn find_all_paginates() {
        let q = users()
            .find_all(FindAll::new().with_limit(10).with_offset(20))
            .unwrap()
            .build_query();
        assert_eq!(q.sql, "SELECT * FROM ?? LIMIT ? OFFSET ?");

        let q = users().find_all(FindAll::new().with_offset(20)).unwrap().build_query();
        assert_eq!(q.sql, "SELECT * FROM ??");

        let err = users()
            .find_all(FindAll::new().with_condition(Where::new()))
            .unwrap_err();
        assert!(err.is_empty_payload());
    }

    #[test]
    fn where_is_required() {
        let model = users();
        assert!(model.find_one("*", json!({}), vec![]).unwrap_err().is_empty_payload());
        assert!(model.remove(json!({})).unwrap_err().is_empty_payload());
        assert!(model.remove_one(Where::new(), vec![]).unwrap_err().is_empty_payload());
        assert!(
            model
                .update_all(json!({"name": "x"}), json!({}), &UpdateOptions::new())
                .unwrap_err()
                .is_empty_payload()
        );
    }

    #[test]
    fn update_one_strips_primary_key() {
        let q = users()
            .update_one(json!({"id": 5, "name": "x"}), json!({"id": 5}), &UpdateOptions::new())
            .unwrap()
            .build_query();
        assert_eq!(q.sql, "UPDATE ?? SET ?? = ? WHERE id = ? LIMIT ?");
        assert_eq!(
            q.params,
            vec!["users".into(), "name".into(), "x".into(), 5.into(), Value::UInt(1)]
        );
    }

    #[test]
    fn insert_record_drops_unknown_columns() {
        let q = users()
            .insert_record(json!([{"name": "a", "junk": 1}, {"name": "b"}]), &InsertOptions::new())
            .unwrap()
            .build_query();
        assert_eq!(q.sql, "INSERT INTO ?? (??) VALUES (?), (?)");

        let err = users().insert_record(json!([]), &InsertOptions::new()).unwrap_err();
        assert!(err.is_empty_payload());
    }

    #[test]
    fn soft_delete_uses_central_field() {
        let q = users()
            .soft_delete_one(json!({"id": 3}), 1, &SoftDeleteOptions::new())
            .unwrap()
            .build_query();
        assert_eq!(q.sql, "UPDATE ?? SET ?? = ? WHERE id = ? LIMIT ?");
        assert_eq!(q.params[1], Value::from("is_deleted"));

        let q = users()
            .soft_delete(
                json!({"id": 3}),
                true,
                &SoftDeleteOptions::new().with_delete_field("deleted_flag"),
            )
            .unwrap()
            .build_query();
        assert_eq!(q.params[1], Value::from("deleted_flag"));
    }

    #[test]
    fn patch_single_field_requires_field() {
        let err = users()
            .patch_single_field("", 1, json!({"id": 1}), &UpdateOptions::new())
            .unwrap_err();
        assert!(err.is_validation());

        let q = users()
            .patch_single_field("email", "a@b.c", json!({"id": 1}), &UpdateOptions::new())
            .unwrap()
            .build_query();
        assert_eq!(q.sql, "UPDATE ?? SET ?? = ? WHERE id = ?");
    }

    #[test]
    fn options_use_central_fields() {
        let model = TableModel::new(
            TableModelConfig::new("t", "tid", ["tid", "made", "changed"]).with_central_fields(
                CentralFields {
                    ctime_field: "made".into(),
                    utime_field: "changed".into(),
                    ..CentralFields::default()
                },
            ),
            None,
        )
        .unwrap();
        assert_eq!(model.update_options().utime_field, "changed");
        assert_eq!(model.update_options().primary_key.as_deref(), Some("tid"));
        assert_eq!(model.insert_options().ctime_field, "made");
    }
}
