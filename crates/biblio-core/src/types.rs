//! # Domain Types
//!
//! Core domain types used throughout Biblio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        Domain Types                           │
//! │                                                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐   │
//! │  │    Book      │  │    Patron    │  │       Loan         │   │
//! │  │ ──────────── │  │ ──────────── │  │ ────────────────── │   │
//! │  │ id (i64)     │  │ id (i64)     │  │ id (i64)           │   │
//! │  │ isbn         │  │ membership # │  │ book_id, patron_id │   │
//! │  │ total copies │  │ status       │  │ due_date, status   │   │
//! │  │ avail copies │  └──────────────┘  │ fine_cents         │   │
//! │  └──────────────┘                    └────────────────────┘   │
//! │                                                               │
//! │  Author / Category: attribute bags referenced by Book.        │
//! │  Deletion is blocked while any Book references them.          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each entity has three companion shapes:
//! - the entity itself (a database row),
//! - `New*` for create operations,
//! - `*Patch` for update operations. Patches enumerate exactly the
//!   updatable fields; an unknown field is unrepresentable, so nothing is
//!   ever set reflectively.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Author
// =============================================================================

/// A book author.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    /// Display name in "First Last" form.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
}

/// Updatable author fields. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
}

impl AuthorPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.nationality.is_none()
    }
}

// =============================================================================
// Category
// =============================================================================

/// A book category. Names are unique (case-sensitive exact match).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Updatable category fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalogued book title with a copy count.
///
/// Invariant: `0 <= available_copies <= total_copies`. Outside the book
/// CRUD path, `available_copies` is mutated only by the loan manager,
/// decremented exactly once per checkout and incremented exactly once per
/// return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub author_id: i64,
    pub category_id: i64,
    pub publisher: Option<String>,
    pub pages: Option<i64>,
    pub description: Option<String>,
    pub total_copies: i64,
    pub available_copies: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Checks whether at least one copy can be lent.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Input for creating a book. All copies start available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub author_id: i64,
    pub category_id: i64,
    pub publisher: Option<String>,
    pub pages: Option<i64>,
    pub description: Option<String>,
    pub total_copies: i64,
}

/// Updatable book fields.
///
/// `total_copies` adjustments shift `available_copies` by the same delta
/// so outstanding loans stay accounted for; the repository rejects a
/// change that would drive `available_copies` below zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub publisher: Option<String>,
    pub pages: Option<i64>,
    pub description: Option<String>,
    pub total_copies: Option<i64>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.isbn.is_none()
            && self.author_id.is_none()
            && self.category_id.is_none()
            && self.publisher.is_none()
            && self.pages.is_none()
            && self.description.is_none()
            && self.total_copies.is_none()
    }
}

// =============================================================================
// Patron
// =============================================================================

/// Membership status of a patron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PatronStatus {
    /// May borrow books.
    Active,
    /// Soft-disabled: record kept, borrowing blocked.
    Inactive,
}

impl Default for PatronStatus {
    fn default() -> Self {
        PatronStatus::Active
    }
}

/// A registered library member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Patron {
    pub id: i64,
    /// Unique membership card number.
    pub membership_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: PatronStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patron {
    /// Display name in "First Last" form.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Only Active patrons may receive new loans.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == PatronStatus::Active
    }
}

/// Input for creating a patron. New patrons start Active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatron {
    pub membership_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Updatable patron fields. Status changes go through the
/// activate/deactivate wrappers, not the patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatronPatch {
    pub membership_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl PatronPatch {
    pub fn is_empty(&self) -> bool {
        self.membership_number.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }
}

// =============================================================================
// Loan
// =============================================================================

/// Status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Checked out, not yet returned.
    Outstanding,
    /// Returned; terminal state, reached exactly once.
    Returned,
}

/// A single checkout record linking one book copy to one patron.
///
/// Created only through the checkout operation, never directly; never
/// deleted. The fine is computed once at return time and immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub patron_id: i64,
    pub checkout_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub fine_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Accrued fine as Money.
    #[inline]
    pub fn fine(&self) -> Money {
        Money::from_cents(self.fine_cents)
    }

    /// An Outstanding loan whose due date is strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == LoanStatus::Outstanding && self.due_date < today
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(status: LoanStatus, due: NaiveDate) -> Loan {
        let now = Utc::now();
        Loan {
            id: 1,
            book_id: 1,
            patron_id: 1,
            checkout_at: now,
            due_date: due,
            returned_at: None,
            status,
            fine_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_overdue_is_strictly_past_due() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let on_due = due;
        let after = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();

        let l = loan(LoanStatus::Outstanding, due);
        assert!(!l.is_overdue(on_due));
        assert!(l.is_overdue(after));

        // Returned loans are never overdue.
        let l = loan(LoanStatus::Returned, due);
        assert!(!l.is_overdue(after));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(BookPatch::default().is_empty());
        let patch = BookPatch {
            title: Some("Dune".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patron_defaults_active() {
        assert_eq!(PatronStatus::default(), PatronStatus::Active);
    }
}
