//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building and execution.
///
/// Every builder error is raised at the call that received the offending
/// input, never deferred to `build_query()`.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A table-qualified operation was invoked without a table
    #[error("Missing table name: {0}")]
    MissingTableName(String),

    /// An empty payload where one is required (insert rows, update values, mutation WHERE)
    #[error("Empty payload: {0}")]
    EmptyPayload(String),

    /// `IN`/`NOT_IN`/`AND`/`OR` given an empty array
    #[error("Empty array condition: {0}")]
    EmptyArrayCondition(String),

    /// `BETWEEN`/`NOT_BETWEEN` given an array whose length is not 2
    #[error("Invalid arity: {0}")]
    InvalidArity(String),

    /// Unrecognized operator key in a condition object
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Mutually exclusive sentinels given together (increment + decrement, several LIKE sugars)
    #[error("Conflicting sentinel: {0}")]
    ConflictingSentinel(String),

    /// Malformed descriptor
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing executor or unknown connection
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Config(String),

    /// Error reported by the injected execution function
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Prefix used for messages raised by the statement builder.
pub(crate) fn builder_msg(operation: &str, message: impl std::fmt::Display) -> String {
    format!("[SQLBuilder] :: {operation} :: {message}")
}

impl OrmError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an empty payload error
    pub fn is_empty_payload(&self) -> bool {
        matches!(self, Self::EmptyPayload(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether the error was raised by the builder itself (a caller programming
    /// error) rather than by the execution function.
    pub fn is_build_error(&self) -> bool {
        !matches!(self, Self::Execution(_))
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
