//! Statement logging.
//!
//! [`LoggingExecutor`] wraps any [`QueryExecutor`] and emits a `tracing` event
//! on target `myorm.sql` before each statement runs. The logged SQL has its
//! params inlined with [`format_query`].

use crate::error::OrmResult;
use crate::executor::{QueryExecutor, QueryOutput};
use crate::format::format_query;
use crate::value::Value;
use futures_core::future::BoxFuture;
use tracing::Level;

/// The kind of statement being run, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryType {
    pub fn from_sql(sql: &str) -> Self {
        let head = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default();
        if head.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if head.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if head.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if head.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// An executor that logs every statement before delegating.
#[derive(Debug, Clone)]
pub struct LoggingExecutor<E> {
    inner: E,
    connection: String,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings. `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl<E> LoggingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            connection: "default".to_string(),
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }

    /// Name reported in the `connection` field.
    pub fn connection(mut self, name: impl Into<String>) -> Self {
        self.connection = name.into();
        self
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn display_sql(&self, sql: &str, params: &[Value]) -> String {
        let formatted = format_query(sql, params);
        match self.max_sql_length {
            Some(max) if formatted.len() > max => {
                format!("{}...", truncate_sql_bytes(&formatted, max))
            }
            _ => formatted,
        }
    }

    fn emit(&self, sql: &str, params: &[Value]) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let shown = self.display_sql(sql, params);
        emit_at_level!(
            self.level,
            target: "myorm.sql",
            connection = %self.connection,
            query_type = ?QueryType::from_sql(sql),
            param_count = params.len(),
            sql = %shown,
        );
    }
}

impl<E: QueryExecutor> QueryExecutor for LoggingExecutor<E> {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, OrmResult<QueryOutput>> {
        Box::pin(async move {
            self.emit(sql, params);
            let result = self.inner.execute(sql, params).await;
            if let Err(err) = &result {
                tracing::warn!(
                    target: "myorm.sql",
                    connection = %self.connection,
                    error = %err,
                    "statement failed"
                );
            }
            result
        })
    }
}
