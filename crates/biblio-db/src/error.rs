//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Error Propagation                         │
//! │                                                               │
//! │  SQLite Error (sqlx::Error)                                   │
//! │       │                                                       │
//! │       ▼                                                       │
//! │  DbError (this module)  ← store faults: connection, query,    │
//! │       │                   constraint violations               │
//! │       ▼                                                       │
//! │  RepoError = Core | Db  ← what every repository returns       │
//! │       │                                                       │
//! │       ▼                                                       │
//! │  Console displays the message; business-rule failures and     │
//! │  store faults are both recovered at the operation boundary    │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use biblio_core::CoreError;
use thiserror::Error;

/// Database operation errors.
///
/// These wrap sqlx errors and provide categorization for user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate membership number
    /// - Inserting a duplicate category name
    #[error("Duplicate {field}: a record with that value already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint message formats:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for low-level database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Repository Error
// =============================================================================

/// What every repository operation returns on failure.
///
/// Business-rule violations (`Core`) and store faults (`Db`) are both
/// recovered at the operation boundary and rendered by the caller; neither
/// is ever thrown past the repository as a panic.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Db(err.into())
    }
}

impl From<biblio_core::ValidationError> for RepoError {
    fn from(err: biblio_core::ValidationError) -> Self {
        RepoError::Core(err.into())
    }
}

impl RepoError {
    /// True when the failure is a business rule, not a store fault.
    pub fn is_business_rule(&self) -> bool {
        matches!(self, RepoError::Core(_))
    }
}

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_parsing() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_repo_error_classification() {
        let core: RepoError = CoreError::BookNotFound(3).into();
        assert!(core.is_business_rule());
        assert_eq!(core.to_string(), "Book not found: 3");

        let db: RepoError = DbError::PoolExhausted.into();
        assert!(!db.is_business_rule());
    }
}
