//! The execution seam.
//!
//! The builder never talks to a database. It hands `(sql, params)` to a
//! [`QueryExecutor`] supplied by the caller and returns whatever that executor
//! produces.

use crate::error::OrmResult;
use crate::value::{Row, Value};
use futures_core::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Result of running one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Rows returned by a SELECT.
    Rows(Vec<Row>),
    /// Outcome of an INSERT, UPDATE or DELETE.
    Write {
        affected_rows: u64,
        insert_id: Option<u64>,
    },
}

impl QueryOutput {
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Write { .. } => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Write { .. } => Vec::new(),
        }
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows().first()
    }

    /// Rows written, or rows returned for a SELECT.
    pub fn affected_rows(&self) -> u64 {
        match self {
            QueryOutput::Rows(rows) => rows.len() as u64,
            QueryOutput::Write { affected_rows, .. } => *affected_rows,
        }
    }

    pub fn insert_id(&self) -> Option<u64> {
        match self {
            QueryOutput::Write { insert_id, .. } => *insert_id,
            QueryOutput::Rows(_) => None,
        }
    }
}

/// Runs a built statement.
///
/// Implementations own connection handling, retries and transactions.
pub trait QueryExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, OrmResult<QueryOutput>>;
}

/// Shared handle to an executor.
pub type SharedExecutor = Arc<dyn QueryExecutor>;

impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, OrmResult<QueryOutput>> {
        (**self).execute(sql, params)
    }
}

/// Adapter turning an async closure into a [`QueryExecutor`].
pub struct FnExecutor<F> {
    f: F,
}

impl<F, Fut> QueryExecutor for FnExecutor<F>
where
    F: Fn(String, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = OrmResult<QueryOutput>> + Send + 'static,
{
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, OrmResult<QueryOutput>> {
        Box::pin((self.f)(sql.to_string(), params.to_vec()))
    }
}

/// Wrap an async closure as a shared executor.
///
/// # Example
/// ```ignore
/// let exec = myorm::executor_fn(|sql, params| async move {
///     println!("{sql} {params:?}");
///     Ok(myorm::QueryOutput::Rows(vec![]))
/// });
/// ```
pub fn executor_fn<F, Fut>(f: F) -> SharedExecutor
where
    F: Fn(String, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OrmResult<QueryOutput>> + Send + 'static,
{
    Arc::new(FnExecutor { f })
}
