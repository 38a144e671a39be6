//! # Loan Repository
//!
//! The loan lifecycle: eligibility checks, checkout, return, fine
//! recording, and the outstanding/overdue queries.
//!
//! ## Loan Lifecycle
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Loan Lifecycle                           │
//! │                                                               │
//! │  1. CHECKOUT (single transaction)                             │
//! │     ├── book exists, copies available                         │
//! │     ├── patron exists, active, no overdue loans               │
//! │     ├── guarded decrement of available_copies                 │
//! │     └── INSERT loan { status: outstanding, fine: 0 }          │
//! │                                                               │
//! │  2. RETURN (single transaction, exactly once)                 │
//! │     ├── fine = whole days late × rate, recorded immutably     │
//! │     ├── guarded flip outstanding → returned                   │
//! │     └── increment available_copies                            │
//! │                                                               │
//! │  Loans are never deleted.                                     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization Points
//! Both mutations hinge on a guarded single-row UPDATE whose
//! `rows_affected` is re-checked inside the transaction:
//! checkout decrements only `WHERE available_copies > 0`, return flips
//! only `WHERE status = 'outstanding'`. Two concurrent checkouts of the
//! last copy therefore produce exactly one success and one Unavailable;
//! two concurrent returns produce one success and one AlreadyReturned.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::RepoResult;
use biblio_core::{fine, CoreError, Loan, LoanStatus, Money};

const LOAN_COLUMNS: &str = "id, book_id, patron_id, checkout_at, due_date, returned_at, \
     status, fine_cents, created_at, updated_at";

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub loan_id: i64,
    pub due_date: NaiveDate,
    /// Confirmation message naming the due date.
    pub message: String,
}

/// Result of a successful return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnReceipt {
    pub loan_id: i64,
    pub fine: Money,
    /// Surfaces the fine amount when one is due, so the caller can prompt
    /// for payment (collection itself is out of scope).
    pub message: String,
}

/// A loan resolved with its book and patron for display.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: i64,
    pub book_id: i64,
    pub patron_id: i64,
    pub book_title: String,
    pub patron_name: String,
    pub checkout_at: chrono::DateTime<Utc>,
    pub due_date: NaiveDate,
    pub returned_at: Option<chrono::DateTime<Utc>>,
    pub status: LoanStatus,
    pub fine_cents: i64,
}

impl LoanRecord {
    /// Accrued fine as Money.
    pub fn fine(&self) -> Money {
        Money::from_cents(self.fine_cents)
    }
}

/// Repository for the loan lifecycle.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: SqlitePool,
}

impl LoanRepository {
    /// Creates a new LoanRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LoanRepository { pool }
    }

    /// Checks out a book to a patron for `period_days`.
    ///
    /// Preconditions, checked in order, first failure wins:
    /// 1. Book exists
    /// 2. Book has an available copy
    /// 3. Patron exists
    /// 4. Patron is active
    /// 5. Patron has no overdue outstanding loan
    ///
    /// Effects are atomic: the copy decrement and the loan insert commit
    /// or roll back together. `period_days` must already be validated as
    /// positive (`validation::validate_loan_period`).
    pub async fn checkout(
        &self,
        book_id: i64,
        patron_id: i64,
        period_days: i64,
    ) -> RepoResult<CheckoutReceipt> {
        debug!(book_id = %book_id, patron_id = %patron_id, days = %period_days, "Checkout requested");

        let mut tx = self.pool.begin().await?;

        let book: Option<(String, i64)> = sqlx::query_as(
            "SELECT title, available_copies FROM books WHERE id = ?1",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (title, available) = book.ok_or(CoreError::BookNotFound(book_id))?;

        if available <= 0 {
            return Err(CoreError::Unavailable { title }.into());
        }

        let patron: Option<(String, String, String)> = sqlx::query_as(
            "SELECT first_name, last_name, status FROM patrons WHERE id = ?1",
        )
        .bind(patron_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (first_name, last_name, status) =
            patron.ok_or(CoreError::PatronNotFound(patron_id))?;

        if status != "active" {
            return Err(CoreError::PatronInactive {
                name: format!("{} {}", first_name, last_name),
            }
            .into());
        }

        let today = Utc::now().date_naive();
        let overdue: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans
             WHERE patron_id = ?1 AND status = 'outstanding' AND due_date < ?2",
        )
        .bind(patron_id)
        .bind(today)
        .fetch_one(&mut *tx)
        .await?;

        if overdue > 0 {
            return Err(CoreError::OutstandingOverdue { count: overdue }.into());
        }

        // Serialization point: the availability check above was only a
        // snapshot; the guard re-verifies under the write lock.
        let now = Utc::now();
        let decremented = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = ?2
             WHERE id = ?1 AND available_copies > 0",
        )
        .bind(book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if decremented.rows_affected() == 0 {
            return Err(CoreError::Unavailable { title }.into());
        }

        let due = fine::due_date(today, period_days);
        let inserted = sqlx::query(
            "INSERT INTO loans (book_id, patron_id, checkout_at, due_date, status, \
             fine_cents, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'outstanding', 0, ?3, ?3)",
        )
        .bind(book_id)
        .bind(patron_id)
        .bind(now)
        .bind(due)
        .execute(&mut *tx)
        .await?;
        let loan_id = inserted.last_insert_rowid();

        tx.commit().await?;

        info!(loan_id = %loan_id, book_id = %book_id, patron_id = %patron_id, due = %due, "Loan created");

        Ok(CheckoutReceipt {
            loan_id,
            due_date: due,
            message: format!("Checkout complete. '{}' is due back by {}.", title, due),
        })
    }

    /// Returns a loan, computing and recording the fine exactly once.
    ///
    /// The fine is a step function of whole calendar days late; returning
    /// on the due date itself costs nothing. Effects are atomic: the
    /// status flip and the copy increment commit or roll back together.
    pub async fn return_loan(&self, loan_id: i64) -> RepoResult<ReturnReceipt> {
        debug!(loan_id = %loan_id, "Return requested");

        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?1"
        ))
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::LoanNotFound(loan_id))?;

        if loan.status == LoanStatus::Returned {
            return Err(CoreError::AlreadyReturned { loan_id }.into());
        }

        let now = Utc::now();
        let today = now.date_naive();
        let days_late = fine::days_late(loan.due_date, today);
        let fine_due = fine::fine_for(loan.due_date, today);

        // Serialization point: a concurrent return that committed after
        // our snapshot read shows up as zero rows affected here.
        let flipped = sqlx::query(
            "UPDATE loans SET status = 'returned', returned_at = ?2, fine_cents = ?3, \
             updated_at = ?2
             WHERE id = ?1 AND status = 'outstanding'",
        )
        .bind(loan_id)
        .bind(now)
        .bind(fine_due.cents())
        .execute(&mut *tx)
        .await?;
        if flipped.rows_affected() == 0 {
            return Err(CoreError::AlreadyReturned { loan_id }.into());
        }

        sqlx::query(
            "UPDATE books SET available_copies = available_copies + 1, updated_at = ?2
             WHERE id = ?1",
        )
        .bind(loan.book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(loan_id = %loan_id, fine = %fine_due, "Loan returned");

        let message = if fine_due.is_positive() {
            format!(
                "Book returned {} day(s) late. Fine due: {}.",
                days_late, fine_due
            )
        } else {
            "Book returned on time. No fine due.".to_string()
        };

        Ok(ReturnReceipt {
            loan_id,
            fine: fine_due,
            message,
        })
    }

    /// Gets a loan by ID.
    pub async fn get(&self, id: i64) -> RepoResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }

    /// All outstanding loans, resolved with book and patron for display.
    /// Stable order: oldest checkout first, then id.
    pub async fn list_outstanding(&self) -> RepoResult<Vec<LoanRecord>> {
        let records = sqlx::query_as::<_, LoanRecord>(
            "SELECT l.id, l.book_id, l.patron_id,
                    b.title AS book_title,
                    p.first_name || ' ' || p.last_name AS patron_name,
                    l.checkout_at, l.due_date, l.returned_at, l.status, l.fine_cents
             FROM loans l
             JOIN books b ON b.id = l.book_id
             JOIN patrons p ON p.id = l.patron_id
             WHERE l.status = 'outstanding'
             ORDER BY l.checkout_at, l.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Outstanding loans whose due date is strictly before today.
    pub async fn list_overdue(&self) -> RepoResult<Vec<LoanRecord>> {
        let today = Utc::now().date_naive();
        let records = sqlx::query_as::<_, LoanRecord>(
            "SELECT l.id, l.book_id, l.patron_id,
                    b.title AS book_title,
                    p.first_name || ' ' || p.last_name AS patron_name,
                    l.checkout_at, l.due_date, l.returned_at, l.status, l.fine_cents
             FROM loans l
             JOIN books b ON b.id = l.book_id
             JOIN patrons p ON p.id = l.patron_id
             WHERE l.status = 'outstanding' AND l.due_date < ?1
             ORDER BY l.checkout_at, l.id",
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// All loans against a book, any status, newest checkout first.
    pub async fn list_by_book(&self, book_id: i64) -> RepoResult<Vec<LoanRecord>> {
        let records = sqlx::query_as::<_, LoanRecord>(
            "SELECT l.id, l.book_id, l.patron_id,
                    b.title AS book_title,
                    p.first_name || ' ' || p.last_name AS patron_name,
                    l.checkout_at, l.due_date, l.returned_at, l.status, l.fine_cents
             FROM loans l
             JOIN books b ON b.id = l.book_id
             JOIN patrons p ON p.id = l.patron_id
             WHERE l.book_id = ?1
             ORDER BY l.checkout_at DESC, l.id DESC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::testutil::{backdate_loan, seed_book, seed_patron, test_db};
    use biblio_core::DEFAULT_LOAN_PERIOD_DAYS;
    use chrono::Duration;

    #[tokio::test]
    async fn test_checkout_decrements_and_return_restores() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 2).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let receipt = db
            .loans()
            .checkout(book.id, patron.id, DEFAULT_LOAN_PERIOD_DAYS)
            .await
            .expect("checkout should succeed");
        assert!(receipt.message.contains(&receipt.due_date.to_string()));

        let after = db.books().get(book.id).await.unwrap().unwrap();
        assert_eq!(after.available_copies, 1);
        assert_eq!(after.total_copies, 2);

        let returned = db
            .loans()
            .return_loan(receipt.loan_id)
            .await
            .expect("return should succeed");
        assert!(returned.fine.is_zero());
        assert!(returned.message.contains("No fine"));

        let after = db.books().get(book.id).await.unwrap().unwrap();
        assert_eq!(after.available_copies, 2);
    }

    #[tokio::test]
    async fn test_copies_exhaust_then_unavailable() {
        // Book with total=2: two checkouts succeed, the third fails and
        // leaves state unchanged.
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 2).await;
        let p1 = seed_patron(&db, "LIB-0001").await;
        let p2 = seed_patron(&db, "LIB-0002").await;
        let p3 = seed_patron(&db, "LIB-0003").await;

        db.loans().checkout(book.id, p1.id, 14).await.unwrap();
        db.loans().checkout(book.id, p2.id, 14).await.unwrap();

        let err = db.loans().checkout(book.id, p3.id, 14).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::Unavailable { .. })
        ));

        let after = db.books().get(book.id).await.unwrap().unwrap();
        assert_eq!(after.available_copies, 0);
        assert_eq!(
            db.loans().list_outstanding().await.unwrap().len(),
            2,
            "failed checkout must not create a loan"
        );
    }

    #[tokio::test]
    async fn test_double_return_fails_already_returned() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let receipt = db.loans().checkout(book.id, patron.id, 14).await.unwrap();
        db.loans().return_loan(receipt.loan_id).await.unwrap();

        let err = db.loans().return_loan(receipt.loan_id).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::AlreadyReturned { .. })
        ));

        // No double increment.
        let after = db.books().get(book.id).await.unwrap().unwrap();
        assert_eq!(after.available_copies, 1);
    }

    #[tokio::test]
    async fn test_return_missing_loan_fails_not_found() {
        let db = test_db().await;
        let err = db.loans().return_loan(999).await.unwrap_err();
        assert!(matches!(err, RepoError::Core(CoreError::LoanNotFound(999))));
    }

    #[tokio::test]
    async fn test_checkout_missing_book_or_patron() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let err = db.loans().checkout(999, patron.id, 14).await.unwrap_err();
        assert!(matches!(err, RepoError::Core(CoreError::BookNotFound(999))));

        let err = db.loans().checkout(book.id, 999, 14).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::PatronNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_inactive_patron_cannot_borrow() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        db.patrons().deactivate(patron.id).await.unwrap();

        let err = db.loans().checkout(book.id, patron.id, 14).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::PatronInactive { .. })
        ));

        let after = db.books().get(book.id).await.unwrap().unwrap();
        assert_eq!(after.available_copies, 1, "state unchanged on failure");
    }

    #[tokio::test]
    async fn test_overdue_patron_blocked_until_resolved() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let other = seed_book(&db, "Hyperion", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let receipt = db.loans().checkout(book.id, patron.id, 14).await.unwrap();

        // Not overdue yet: a second loan is allowed. The block only
        // triggers once a due date is strictly in the past.
        let overdue_due = Utc::now().date_naive() - Duration::days(3);
        backdate_loan(&db, receipt.loan_id, overdue_due).await;

        let err = db.loans().checkout(other.id, patron.id, 14).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::OutstandingOverdue { count: 1 })
        ));

        // Returning the overdue loan unblocks the patron.
        db.loans().return_loan(receipt.loan_id).await.unwrap();
        db.loans().checkout(other.id, patron.id, 14).await.unwrap();
    }

    #[tokio::test]
    async fn test_late_return_charges_per_day() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let receipt = db.loans().checkout(book.id, patron.id, 14).await.unwrap();

        // Due 3 days ago at $10.00/day → $30.00.
        let due = Utc::now().date_naive() - Duration::days(3);
        backdate_loan(&db, receipt.loan_id, due).await;

        let returned = db.loans().return_loan(receipt.loan_id).await.unwrap();
        assert_eq!(returned.fine, Money::from_cents(3000));
        assert!(returned.message.contains("$30.00"));

        // Fine recorded immutably on the loan row.
        let loan = db.loans().get(receipt.loan_id).await.unwrap().unwrap();
        assert_eq!(loan.fine_cents, 3000);
        assert_eq!(loan.status, LoanStatus::Returned);
        assert!(loan.returned_at.is_some());
    }

    #[tokio::test]
    async fn test_return_on_due_date_is_free() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let receipt = db.loans().checkout(book.id, patron.id, 14).await.unwrap();
        backdate_loan(&db, receipt.loan_id, Utc::now().date_naive()).await;

        let returned = db.loans().return_loan(receipt.loan_id).await.unwrap();
        assert!(returned.fine.is_zero());
    }

    #[tokio::test]
    async fn test_outstanding_and_overdue_queries() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 2).await;
        let p1 = seed_patron(&db, "LIB-0001").await;
        let p2 = seed_patron(&db, "LIB-0002").await;

        let first = db.loans().checkout(book.id, p1.id, 14).await.unwrap();
        db.loans().checkout(book.id, p2.id, 14).await.unwrap();

        let outstanding = db.loans().list_outstanding().await.unwrap();
        assert_eq!(outstanding.len(), 2);
        assert_eq!(outstanding[0].book_title, "Dune");
        assert!(outstanding[0].patron_name.contains(' '));

        // Overdue is the strict subset past due.
        assert!(db.loans().list_overdue().await.unwrap().is_empty());
        backdate_loan(&db, first.loan_id, Utc::now().date_naive() - Duration::days(1)).await;
        let overdue = db.loans().list_overdue().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, first.loan_id);
    }

    #[tokio::test]
    async fn test_list_by_book_newest_first() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let first = db.loans().checkout(book.id, patron.id, 14).await.unwrap();
        db.loans().return_loan(first.loan_id).await.unwrap();
        let second = db.loans().checkout(book.id, patron.id, 14).await.unwrap();

        let history = db.loans().list_by_book(book.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.loan_id, "newest checkout first");
        assert_eq!(history[1].id, first.loan_id);
        assert_eq!(history[1].status, LoanStatus::Returned);
    }
}
