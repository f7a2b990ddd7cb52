//! Named executors.
//!
//! A [`DatabaseRegistry`] maps connection names to [`Database`] handles. The
//! process-wide instance is available through [`DatabaseRegistry::global`].

use crate::error::{OrmError, OrmResult};
use crate::executor::{QueryOutput, SharedExecutor};
use crate::format::format_query;
use crate::model::{TableModel, TableModelConfig};
use crate::monitor::LoggingExecutor;
use crate::qb::SqlBuilder;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::info;

/// Options for a registered connection.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Log every statement through [`LoggingExecutor`].
    pub verbose: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self { verbose: true }
    }
}

impl DatabaseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// One named connection.
#[derive(Clone)]
pub struct Database {
    name: String,
    executor: SharedExecutor,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Database {
    pub fn new(name: impl Into<String>, executor: SharedExecutor, options: &DatabaseOptions) -> Self {
        let name = name.into();
        let executor: SharedExecutor = if options.verbose {
            Arc::new(LoggingExecutor::new(executor).connection(name.clone()))
        } else {
            executor
        };
        Self { name, executor }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executor(&self) -> SharedExecutor {
        self.executor.clone()
    }

    /// A statement builder running on this connection.
    pub fn builder(&self) -> SqlBuilder {
        SqlBuilder::with_executor(self.executor.clone())
    }

    /// Inline `params` into `sql` for display.
    pub fn format_query(&self, sql: &str, params: &[Value]) -> String {
        format_query(sql, params)
    }

    /// Run raw SQL on this connection.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<QueryOutput> {
        self.executor.execute(sql, params).await
    }

    /// A table model bound to this connection.
    pub fn table_model(&self, config: TableModelConfig) -> OrmResult<TableModel> {
        TableModel::new(config, Some(self.executor.clone()))
    }
}

/// Connection name → [`Database`].
#[derive(Debug, Default)]
pub struct DatabaseRegistry {
    databases: RwLock<HashMap<String, Arc<Database>>>,
}

impl DatabaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static DatabaseRegistry {
        static GLOBAL: OnceLock<DatabaseRegistry> = OnceLock::new();
        GLOBAL.get_or_init(DatabaseRegistry::new)
    }

    /// Register (or replace) a connection.
    pub fn register(
        &self,
        name: impl Into<String>,
        executor: SharedExecutor,
        options: &DatabaseOptions,
    ) -> Arc<Database> {
        let db = Arc::new(Database::new(name, executor, options));
        let replaced = self
            .databases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(db.name.clone(), db.clone())
            .is_some();
        info!(connection = %db.name, replaced, "database registered");
        db
    }

    /// Look up a connection by name.
    pub fn get(&self, name: &str) -> OrmResult<Arc<Database>> {
        self.databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| {
                OrmError::configuration(format!(
                    "Database instance <{name}> not found. Register it first."
                ))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .databases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Database>> {
        let removed = self
            .databases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if removed.is_some() {
            info!(connection = %name, "database removed");
        }
        removed
    }
}
