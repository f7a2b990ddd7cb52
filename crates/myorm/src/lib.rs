//! # myorm
//!
//! A parameterized SQL statement builder for MySQL.
//!
//! ## Features
//!
//! - **Placeholders, not strings**: identifiers bind as `??`, values bind as `?`
//! - **Grammar in the types**: `offset()` before `limit()` or `join()` after `where_()` do not compile
//! - **Nested conditions**: AND/OR trees, operator objects and raw fragments, typed or from JSON
//! - **Safe defaults**: an empty condition on UPDATE or DELETE is an error
//! - **Bring your own driver**: statements run through an injected [`QueryExecutor`]
//! - **Statement logging**: [`monitor::LoggingExecutor`] emits every statement through `tracing`
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use myorm::{SqlBuilder, executor_fn, QueryOutput};
//! use serde_json::json;
//!
//! let exec = executor_fn(|sql, params| async move {
//!     // hand (sql, params) to a MySQL driver here
//!     Ok(QueryOutput::Rows(vec![]))
//! });
//! let qb = SqlBuilder::with_executor(exec);
//!
//! // SELECT
//! let rows = qb
//!     .select(json!(["name", {"email": "email_address"}]))?
//!     .from("users u")?
//!     .where_(json!({"active": 1}))?
//!     .execute_query()
//!     .await?;
//!
//! // INSERT
//! qb.insert("users", json!([{"name": "a"}, {"name": "b"}]), &Default::default())?
//!     .execute_query()
//!     .await?;
//!
//! // UPDATE
//! qb.update("accounts")?
//!     .set(json!({"balance": {"increment": 5}}))?
//!     .where_(json!({"id": 7}))?
//!     .execute_query()
//!     .await?;
//!
//! // DELETE
//! qb.delete_from("sessions")?
//!     .where_(json!({"expired": true}))?
//!     .execute_query()
//!     .await?;
//! ```

pub mod condition;
pub mod error;
pub mod executor;
pub mod format;
pub mod ident;
pub mod model;
pub mod monitor;
pub mod qb;
pub mod registry;
pub mod value;

pub use condition::{BoolOp, Cond, IntoCondition, Like, Op, Test, Where};
pub use error::{OrmError, OrmResult};
pub use executor::{FnExecutor, QueryExecutor, QueryOutput, SharedExecutor, executor_fn};
pub use format::{escape_literal, format_query};
pub use model::{
    CentralFields, FindAll, ModelsFile, SoftDeleteOptions, TableModel, TableModelConfig,
};
pub use monitor::{LoggingExecutor, QueryType};
pub use registry::{Database, DatabaseOptions, DatabaseRegistry};
pub use value::{Row, Value, row};

// Re-export the builder surface for easy access
pub use qb::{
    Assign, BuildOptions, BuiltQuery, Direction, Field, Fields, InsertOptions, IntoAssignments,
    IntoFields, IntoRows, JoinType, OrderBy, Query, SqlBuilder, Timestamp, UpdateOptions,
    UpdateValues,
};
