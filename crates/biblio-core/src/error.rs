//! # Error Types
//!
//! Domain-specific error types for biblio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        Error Types                            │
//! │                                                               │
//! │  biblio-core errors (this file)                               │
//! │  ├── CoreError        - Business rule violations              │
//! │  └── ValidationError  - Input validation failures             │
//! │                                                               │
//! │  biblio-db errors (separate crate)                            │
//! │  └── DbError          - Database operation failures           │
//! │                                                               │
//! │  Flow: ValidationError → CoreError → rendered by the console  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation returns one of these as a value; nothing here is ever
//! allowed to escape the repository boundary as a panic. Each variant
//! renders a human-readable message naming the violated precondition.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// These are expected, recoverable outcomes of catalog operations. The
/// presentation layer displays the message and continues.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced book does not exist.
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    /// Referenced author does not exist.
    #[error("Author not found: {0}")]
    AuthorNotFound(i64),

    /// Referenced category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    /// Referenced patron does not exist.
    #[error("Patron not found: {0}")]
    PatronNotFound(i64),

    /// Referenced loan does not exist.
    #[error("Loan not found: {0}")]
    LoanNotFound(i64),

    /// No copies left to lend.
    ///
    /// ## When This Occurs
    /// - `available_copies` is already 0 at checkout
    /// - A concurrent checkout claimed the last copy first
    #[error("No copies of '{title}' are available")]
    Unavailable { title: String },

    /// Patron status is Inactive; inactive patrons may not borrow.
    #[error("Patron '{name}' is not active")]
    PatronInactive { name: String },

    /// Patron holds at least one overdue outstanding loan.
    ///
    /// A patron with any overdue loan may not borrow again until it is
    /// resolved. There is no cap on non-overdue outstanding loans.
    #[error("Patron has {count} overdue loan(s); resolve them before borrowing")]
    OutstandingOverdue { count: i64 },

    /// The loan was already returned; a loan flips to Returned exactly once.
    #[error("Loan {loan_id} was already returned")]
    AlreadyReturned { loan_id: i64 },

    /// Delete blocked while other rows still reference the target.
    ///
    /// ## When This Occurs
    /// - Deleting a book with loans (any status)
    /// - Deleting an author or category with books
    #[error("Cannot delete {entity}: {dependents} dependent record(s) exist")]
    HasDependents { entity: String, dependents: i64 },

    /// Name uniqueness violation (case-sensitive exact match).
    #[error("A category named '{name}' already exists")]
    DuplicateName { name: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs, at the boundary where free-text
/// input becomes typed arguments.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be a positive integer.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is below the smallest acceptable value.
    #[error("{field} must be at least {min}")]
    TooSmall { field: String, min: i64 },

    /// Invalid format (e.g. malformed ISBN or email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_precondition() {
        let err = CoreError::Unavailable {
            title: "Dune".to_string(),
        };
        assert_eq!(err.to_string(), "No copies of 'Dune' are available");

        let err = CoreError::OutstandingOverdue { count: 2 };
        assert_eq!(
            err.to_string(),
            "Patron has 2 overdue loan(s); resolve them before borrowing"
        );

        let err = CoreError::AlreadyReturned { loan_id: 7 };
        assert_eq!(err.to_string(), "Loan 7 was already returned");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");

        let err = ValidationError::MustBePositive {
            field: "loan period".to_string(),
        };
        assert_eq!(err.to_string(), "loan period must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "isbn".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
