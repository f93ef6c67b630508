//! Error types for the Redshift dialect adapter.
//!
//! Pure computations (type mapping, date/time expressions, connection
//! descriptors) never fail under well-formed input. Catalog queries fail fast:
//! every driver failure is surfaced as [`DialectError::CatalogAccess`] so the
//! host can abort a sync cycle instead of publishing a partial snapshot.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialectError {
    #[error("Configuration error: {field} - {message}")]
    Configuration { field: String, message: String },

    #[error("Catalog access failed during {operation}: {message}")]
    CatalogAccess {
        operation: String,
        message: String,
        /// e.g., "42501" for insufficient privilege
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl DialectError {
    /// Create a configuration error for a connection field.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a catalog access error with a helpful suggestion.
    pub fn catalog_access(
        operation: impl Into<String>,
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::CatalogAccess {
            operation: operation.into(),
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Attach the catalog operation that was running when the error occurred.
    ///
    /// Only catalog access errors carry an operation; other variants pass
    /// through untouched.
    pub fn context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::CatalogAccess {
                message,
                sql_state,
                suggestion,
                ..
            } => Self::CatalogAccess {
                operation: operation.into(),
                message,
                sql_state,
                suggestion,
            },
            other => other,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::CatalogAccess { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Get the SQLSTATE reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::CatalogAccess { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is retryable by the connection layer.
    ///
    /// This crate never retries; the flag is for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CatalogAccess { sql_state, .. } => sql_state.is_none(),
            _ => false,
        }
    }
}

/// Convert sqlx errors to catalog access errors.
///
/// The operation is filled in by the introspector via [`DialectError::context`].
impl From<sqlx::Error> for DialectError {
    fn from(err: sqlx::Error) -> Self {
        const OPERATION: &str = "catalog query";
        match err {
            sqlx::Error::Configuration(msg) => DialectError::catalog_access(
                OPERATION,
                msg.to_string(),
                None,
                "Check the connection descriptor and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DialectError::catalog_access(
                    OPERATION,
                    db_err.message(),
                    code,
                    "Check that the user can read pg_catalog and information_schema",
                )
            }
            sqlx::Error::PoolTimedOut => DialectError::catalog_access(
                OPERATION,
                "Timed out acquiring a connection",
                None,
                "Check cluster availability and pool sizing",
            ),
            sqlx::Error::PoolClosed => DialectError::catalog_access(
                OPERATION,
                "Connection pool is closed",
                None,
                "Reconnect to the cluster",
            ),
            sqlx::Error::Io(io_err) => DialectError::catalog_access(
                OPERATION,
                format!("I/O error: {}", io_err),
                None,
                "Check network connectivity and cluster status",
            ),
            sqlx::Error::Tls(tls_err) => DialectError::catalog_access(
                OPERATION,
                format!("TLS error: {}", tls_err),
                None,
                "Redshift requires TLS; build with a TLS feature and verify certificates",
            ),
            sqlx::Error::Protocol(msg) => DialectError::catalog_access(
                OPERATION,
                format!("Protocol error: {}", msg),
                None,
                "Check cluster compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => DialectError::catalog_access(
                OPERATION,
                format!("Column not found: {}", col),
                None,
                "The catalog layout differs from the expected Redshift layout",
            ),
            sqlx::Error::ColumnDecode { index, source } => DialectError::catalog_access(
                OPERATION,
                format!("Failed to decode column {}: {}", index, source),
                None,
                "The catalog layout differs from the expected Redshift layout",
            ),
            other => DialectError::catalog_access(
                OPERATION,
                format!("Database error: {}", other),
                None,
                "Check the connection and retry the sync",
            ),
        }
    }
}

/// Result type alias for dialect operations.
pub type DialectResult<T> = Result<T, DialectError>;
