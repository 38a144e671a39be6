//! # Validation Module
//!
//! Input validation for catalog data.
//!
//! Runs at the boundary where free-text input becomes typed arguments,
//! before any business logic or database work. The database adds its own
//! NOT NULL / UNIQUE / CHECK constraints underneath.
//!
//! ## Usage
//! ```rust
//! use biblio_core::validation::{validate_isbn, validate_loan_period};
//!
//! validate_isbn("978-0441013593").unwrap();
//! assert!(validate_loan_period(0).is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a book title: non-empty, at most 200 characters.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    require_non_empty("title", title)?;
    require_max_len("title", title, 200)
}

/// Validates an ISBN.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Digits, hyphens, and a trailing X (ISBN-10 check digit) only
pub fn validate_isbn(isbn: &str) -> ValidationResult<()> {
    let isbn = isbn.trim();
    require_non_empty("isbn", isbn)?;
    require_max_len("isbn", isbn, 20)?;

    if !isbn
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == 'X' || c == 'x')
    {
        return Err(ValidationError::InvalidFormat {
            field: "isbn".to_string(),
            reason: "must contain only digits, hyphens, and X".to_string(),
        });
    }

    Ok(())
}

/// Validates a person name part (first or last): non-empty, at most 100 chars.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    require_non_empty(field, name)?;
    require_max_len(field, name, 100)
}

/// Validates a membership card number: non-empty, at most 30 characters,
/// alphanumeric plus hyphens.
pub fn validate_membership_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();
    require_non_empty("membership number", number)?;
    require_max_len("membership number", number, 30)?;

    if !number.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "membership number".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address. Shallow check: one '@' with text on both
/// sides; the library is not in the business of full RFC 5322 parsing.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    require_non_empty("email", email)?;
    require_max_len("email", email, 200)?;

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a copy count: must be a positive integer.
pub fn validate_copies(copies: i64) -> ValidationResult<()> {
    if copies <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "copies".to_string(),
        });
    }
    Ok(())
}

/// Validates a loan period in days: must be a positive integer.
///
/// Callers reject bad input with this before invoking checkout; the loan
/// manager assumes the period is already valid.
pub fn validate_loan_period(days: i64) -> ValidationResult<()> {
    if days <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "loan period".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn require_non_empty(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_accepts_common_forms() {
        assert!(validate_isbn("978-0441013593").is_ok());
        assert!(validate_isbn("0441013597").is_ok());
        assert!(validate_isbn("080442957X").is_ok());
    }

    #[test]
    fn test_isbn_rejects_garbage() {
        assert!(validate_isbn("").is_err());
        assert!(validate_isbn("not an isbn").is_err());
        assert!(validate_isbn(&"9".repeat(30)).is_err());
    }

    #[test]
    fn test_membership_number() {
        assert!(validate_membership_number("LIB-0042").is_ok());
        assert!(validate_membership_number("").is_err());
        assert!(validate_membership_number("no spaces allowed").is_err());
    }

    #[test]
    fn test_email_shallow_check() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("nope").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@nodot").is_err());
    }

    #[test]
    fn test_positive_integers() {
        assert!(validate_copies(1).is_ok());
        assert!(validate_copies(0).is_err());
        assert!(validate_loan_period(14).is_ok());
        assert!(validate_loan_period(-3).is_err());
    }
}
