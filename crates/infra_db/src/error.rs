//! Database error types
//!
//! This module defines the error types that can occur during database operations,
//! and how they surface to the domain as `PortError`s.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// The connection settings are unusable
    #[error("Invalid database configuration: {0}")]
    Configuration(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be mapped to a domain type
    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// LISTEN/NOTIFY channel failure
    #[error("Change listener failed: {0}")]
    ListenerFailed(String),

    /// Any other driver error
    #[error("SQL error: {0}")]
    SqlError(String),
}

impl DatabaseError {
    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Classifies SQLx errors so callers can tell outages from bad queries
///
/// Repository methods rely on this through `?`.
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed => DatabaseError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23514") => {
                        DatabaseError::ConstraintViolation(db_err.message().to_string())
                    }
                    _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::InvalidValue(error.to_string())
            }
            other => DatabaseError::SqlError(other.to_string()),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        if error.is_connection_error() {
            return PortError::Connection {
                message: error.to_string(),
                source: Some(Box::new(error)),
            };
        }
        match error {
            DatabaseError::NotFound(message) => PortError::not_found("record", message),
            DatabaseError::InvalidValue(message) => PortError::transformation(message),
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_a_transient_port_error() {
        let error = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, DatabaseError::PoolExhausted));
        assert!(PortError::from(error).is_transient());
    }

    #[test]
    fn test_io_failure_maps_to_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = DatabaseError::from(sqlx::Error::Io(io));
        assert!(matches!(error, DatabaseError::ConnectionFailed(_)));
        assert!(PortError::from(error).is_transient());
    }

    #[test]
    fn test_missing_row_maps_to_not_found() {
        let error = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, DatabaseError::NotFound(_)));
        assert!(matches!(PortError::from(error), PortError::NotFound { .. }));
    }

    #[test]
    fn test_decode_failure_becomes_transformation_error() {
        let error = DatabaseError::from(sqlx::Error::Decode("bad numeric".into()));
        assert!(matches!(error, DatabaseError::InvalidValue(_)));
        assert!(matches!(PortError::from(error), PortError::Transformation { .. }));
    }

    #[test]
    fn test_other_driver_errors_are_internal() {
        let error = DatabaseError::from(sqlx::Error::Protocol("unexpected message".into()));
        assert!(matches!(error, DatabaseError::SqlError(_)));

        let port_error = PortError::from(error);
        assert!(matches!(port_error, PortError::Internal { .. }));
        assert!(!port_error.is_transient());
    }
}
