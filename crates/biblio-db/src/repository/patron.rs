//! # Patron Repository
//!
//! Database operations for patrons.
//!
//! Activate/deactivate are named wrappers that flip the status column
//! without touching the rest of the record; deactivation is the supported
//! way to retire a member, since loans reference patrons forever.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::RepoResult;
use biblio_core::{
    validation, CoreError, Loan, NewPatron, Patron, PatronPatch, PatronStatus,
};

const PATRON_COLUMNS: &str = "id, membership_number, first_name, last_name, email, phone, \
     address, status, created_at, updated_at";

const LOAN_COLUMNS: &str = "id, book_id, patron_id, checkout_at, due_date, returned_at, \
     status, fine_cents, created_at, updated_at";

/// Repository for patron database operations.
#[derive(Debug, Clone)]
pub struct PatronRepository {
    pool: SqlitePool,
}

impl PatronRepository {
    /// Creates a new PatronRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatronRepository { pool }
    }

    /// Lists all patrons, ordered by last then first name.
    pub async fn list(&self) -> RepoResult<Vec<Patron>> {
        let patrons = sqlx::query_as::<_, Patron>(&format!(
            "SELECT {PATRON_COLUMNS} FROM patrons ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(patrons)
    }

    /// Gets a patron by ID.
    pub async fn get(&self, id: i64) -> RepoResult<Option<Patron>> {
        let patron = sqlx::query_as::<_, Patron>(&format!(
            "SELECT {PATRON_COLUMNS} FROM patrons WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patron)
    }

    /// Gets a patron by membership card number (exact match).
    pub async fn get_by_membership(&self, number: &str) -> RepoResult<Option<Patron>> {
        let patron = sqlx::query_as::<_, Patron>(&format!(
            "SELECT {PATRON_COLUMNS} FROM patrons WHERE membership_number = ?1"
        ))
        .bind(number.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(patron)
    }

    /// Searches patrons by name or membership number (substring match).
    pub async fn search(&self, term: &str) -> RepoResult<Vec<Patron>> {
        debug!(term = %term, "Searching patrons");

        let pattern = format!("%{}%", term.trim());
        let patrons = sqlx::query_as::<_, Patron>(&format!(
            "SELECT {PATRON_COLUMNS} FROM patrons
             WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR membership_number LIKE ?1
             ORDER BY last_name, first_name"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(patrons)
    }

    /// Creates a patron. New patrons start Active; the UNIQUE column on
    /// membership_number rejects duplicates.
    pub async fn create(&self, new: NewPatron) -> RepoResult<Patron> {
        validation::validate_membership_number(&new.membership_number)?;
        validation::validate_name("first name", &new.first_name)?;
        validation::validate_name("last name", &new.last_name)?;
        validation::validate_email(&new.email)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO patrons (membership_number, first_name, last_name, email, phone, \
             address, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        )
        .bind(new.membership_number.trim())
        .bind(new.first_name.trim())
        .bind(new.last_name.trim())
        .bind(new.email.trim())
        .bind(&new.phone)
        .bind(&new.address)
        .bind(PatronStatus::Active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id = %id, membership = %new.membership_number, "Patron created");

        self.require(id).await
    }

    /// Applies a typed patch to a patron. Status is not patchable; use
    /// [`Self::activate`] / [`Self::deactivate`].
    pub async fn update(&self, id: i64, patch: PatronPatch) -> RepoResult<Patron> {
        if patch.is_empty() {
            return self.require(id).await;
        }

        if let Some(number) = &patch.membership_number {
            validation::validate_membership_number(number)?;
        }
        if let Some(first) = &patch.first_name {
            validation::validate_name("first name", first)?;
        }
        if let Some(last) = &patch.last_name {
            validation::validate_name("last name", last)?;
        }
        if let Some(email) = &patch.email {
            validation::validate_email(email)?;
        }

        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE patrons SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(number) = &patch.membership_number {
            qb.push(", membership_number = ").push_bind(number.trim());
        }
        if let Some(first) = &patch.first_name {
            qb.push(", first_name = ").push_bind(first.trim());
        }
        if let Some(last) = &patch.last_name {
            qb.push(", last_name = ").push_bind(last.trim());
        }
        if let Some(email) = &patch.email {
            qb.push(", email = ").push_bind(email.trim());
        }
        if let Some(phone) = &patch.phone {
            qb.push(", phone = ").push_bind(phone);
        }
        if let Some(address) = &patch.address {
            qb.push(", address = ").push_bind(address);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::PatronNotFound(id).into());
        }

        self.require(id).await
    }

    /// Reinstates a patron (status → Active).
    pub async fn activate(&self, id: i64) -> RepoResult<Patron> {
        self.set_status(id, PatronStatus::Active).await
    }

    /// Retires a patron without deleting the record (status → Inactive).
    pub async fn deactivate(&self, id: i64) -> RepoResult<Patron> {
        self.set_status(id, PatronStatus::Inactive).await
    }

    /// Lists a patron's outstanding loans.
    pub async fn outstanding_loans(&self, patron_id: i64) -> RepoResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans
             WHERE patron_id = ?1 AND status = 'outstanding'
             ORDER BY checkout_at, id"
        ))
        .bind(patron_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Deletes a patron. Blocked with HasDependents while loans (of any
    /// status) reference the patron; prefer [`Self::deactivate`].
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let patron = sqlx::query_as::<_, Patron>(&format!(
            "SELECT {PATRON_COLUMNS} FROM patrons WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::PatronNotFound(id))?;

        let dependents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE patron_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if dependents > 0 {
            return Err(CoreError::HasDependents {
                entity: format!("patron '{}'", patron.full_name()),
                dependents,
            }
            .into());
        }

        sqlx::query("DELETE FROM patrons WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(id = %id, "Patron deleted");
        Ok(())
    }

    async fn set_status(&self, id: i64, status: PatronStatus) -> RepoResult<Patron> {
        let result = sqlx::query("UPDATE patrons SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::PatronNotFound(id).into());
        }

        debug!(id = %id, ?status, "Patron status changed");
        self.require(id).await
    }

    /// Fetches a patron that must exist.
    async fn require(&self, id: i64) -> RepoResult<Patron> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::PatronNotFound(id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, RepoError};
    use crate::testutil::{seed_book, seed_patron, test_db};

    #[tokio::test]
    async fn test_create_starts_active() {
        let db = test_db().await;
        let patron = seed_patron(&db, "LIB-0001").await;
        assert!(patron.is_active());
        assert_eq!(patron.full_name(), "Ana Reyes");
    }

    #[tokio::test]
    async fn test_membership_number_is_unique() {
        let db = test_db().await;
        seed_patron(&db, "LIB-0001").await;

        let err = db
            .patrons()
            .create(NewPatron {
                membership_number: "LIB-0001".to_string(),
                first_name: "Luis".to_string(),
                last_name: "Mora".to_string(),
                email: "luis@example.com".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Db(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivate_is_soft_and_reversible() {
        let db = test_db().await;
        let patron = seed_patron(&db, "LIB-0001").await;

        let off = db.patrons().deactivate(patron.id).await.unwrap();
        assert_eq!(off.status, PatronStatus::Inactive);
        // Record still fetchable: deactivation is a toggle, not removal.
        assert!(db.patrons().get(patron.id).await.unwrap().is_some());

        let on = db.patrons().activate(patron.id).await.unwrap();
        assert_eq!(on.status, PatronStatus::Active);
    }

    #[tokio::test]
    async fn test_get_by_membership_and_search() {
        let db = test_db().await;
        seed_patron(&db, "LIB-0042").await;

        let patron = db.patrons().get_by_membership("LIB-0042").await.unwrap();
        assert!(patron.is_some());
        assert!(db.patrons().get_by_membership("LIB-9999").await.unwrap().is_none());

        assert_eq!(db.patrons().search("Reyes").await.unwrap().len(), 1);
        assert_eq!(db.patrons().search("0042").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_loans() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;
        db.loans().checkout(book.id, patron.id, 14).await.unwrap();

        let err = db.patrons().delete(patron.id).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::HasDependents { .. })
        ));

        let fresh = seed_patron(&db, "LIB-0002").await;
        db.patrons().delete(fresh.id).await.unwrap();
        assert!(db.patrons().get(fresh.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_outstanding_loans_for_patron() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 2).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        assert!(db.patrons().outstanding_loans(patron.id).await.unwrap().is_empty());

        let receipt = db.loans().checkout(book.id, patron.id, 14).await.unwrap();
        let loans = db.patrons().outstanding_loans(patron.id).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].id, receipt.loan_id);

        db.loans().return_loan(receipt.loan_id).await.unwrap();
        assert!(db.patrons().outstanding_loans(patron.id).await.unwrap().is_empty());
    }
}
