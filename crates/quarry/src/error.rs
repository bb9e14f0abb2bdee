//! Error types for quarry

use thiserror::Error;

use crate::connection::DriverError;
use crate::value::Value;

/// Result type alias for quarry operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for building, executing and hydrating queries
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error (open, transaction control)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The builder cannot produce a statement (missing table, conflicting verbs)
    #[error("Query error: {0}")]
    Query(String),

    /// A caller supplied an out-of-range argument
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The driver rejected a generated statement
    #[error("Execution error: {source} (sql: {sql})")]
    Execution {
        sql: String,
        params: Vec<Value>,
        #[source]
        source: DriverError,
    },

    /// Entity type not registered with the session
    #[error("Model resolution error: {0}")]
    ModelResolution(String),

    /// Relation name not declared on the entity
    #[error("Relation '{relation}' is not declared on '{entity}'")]
    RelationNotFound { entity: String, relation: String },

    /// Scope name not declared on the entity
    #[error("Scope '{scope}' is not declared on '{entity}'")]
    ScopeNotFound { entity: String, scope: String },

    /// Relation declared with keys that cannot be resolved
    #[error("Relation misconfigured: {0}")]
    RelationMisconfigured(String),

    /// Row to entity mapping error
    #[error("Hydration error on column '{column}': {message}")]
    Hydration { column: String, message: String },

    /// Cache storage or payload error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Operation not available in this mode
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl OrmError {
    /// Create a query construction error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Create a hydration error for a specific column
    pub fn hydration(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hydration {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a relation-not-found error
    pub fn relation_not_found(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::RelationNotFound {
            entity: entity.into(),
            relation: relation.into(),
        }
    }

    /// Create a scope-not-found error
    pub fn scope_not_found(entity: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::ScopeNotFound {
            entity: entity.into(),
            scope: scope.into(),
        }
    }

    /// Create a cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an execution error
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Check if this is a cache error
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache(_))
    }

    /// The SQL text attached to an execution error.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Connection(err.to_string())
    }
}
