//! Structured error types for finctl-core.
//!
//! Uses `thiserror` so callers can match on the failure class.
//! The CLI wraps these in `anyhow` at its command boundaries.

use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum FinanceError {
    /// A database connection could not be acquired
    #[error("Connection failure ({host}:{port}): {source}")]
    Connection {
        host: String,
        port: u16,
        source: sqlx::Error,
    },

    /// A write statement failed; the transaction was rolled back
    #[error("Insert failed: {source}")]
    Insert { source: sqlx::Error },

    /// A read statement failed
    #[error("Query failed during {operation}: {source}")]
    Query {
        operation: &'static str,
        source: sqlx::Error,
    },

    /// Configuration missing or malformed
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for finctl-core operations
pub type Result<T> = std::result::Result<T, FinanceError>;

impl FinanceError {
    /// Create a connection error for the given endpoint
    pub fn connection(host: impl Into<String>, port: u16, source: sqlx::Error) -> Self {
        Self::Connection {
            host: host.into(),
            port,
            source,
        }
    }

    /// Create an insert error
    pub fn insert(source: sqlx::Error) -> Self {
        Self::Insert { source }
    }

    /// Create a read query error
    pub fn query(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Query { operation, source }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_insert_failure(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FinanceError::connection("db.internal", 3307, sqlx::Error::RowNotFound);
        let msg = err.to_string();
        assert!(msg.starts_with("Connection failure (db.internal:3307)"));

        let err = FinanceError::query("list_transactions", sqlx::Error::RowNotFound);
        assert!(err.to_string().contains("list_transactions"));

        let err = FinanceError::config("DB_USER is not set");
        assert_eq!(err.to_string(), "Configuration error: DB_USER is not set");
    }

    #[test]
    fn test_insert_error_keeps_cause() {
        use std::error::Error as _;

        let err = FinanceError::insert(sqlx::Error::RowNotFound);
        assert!(err.is_insert_failure());
        assert!(!err.is_connection_failure());
        assert!(err.source().is_some());
    }
}
