//! # Author Repository
//!
//! Database operations for authors.
//!
//! Authors are simple attribute bags referenced by books; the only
//! business rule here is that deletion is blocked while any book still
//! references the author.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::RepoResult;
use biblio_core::{validation, Author, AuthorPatch, CoreError, NewAuthor};

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, nationality, created_at, updated_at";

/// Repository for author database operations.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    /// Creates a new AuthorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuthorRepository { pool }
    }

    /// Lists all authors, ordered by last then first name.
    pub async fn list(&self) -> RepoResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY last_name, first_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Gets an author by ID.
    pub async fn get(&self, id: i64) -> RepoResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    /// Searches authors by name or nationality (substring match).
    pub async fn search(&self, term: &str) -> RepoResult<Vec<Author>> {
        debug!(term = %term, "Searching authors");

        let pattern = format!("%{}%", term.trim());
        let authors = sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors
             WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR nationality LIKE ?1
             ORDER BY last_name, first_name"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Creates an author.
    pub async fn create(&self, new: NewAuthor) -> RepoResult<Author> {
        validation::validate_name("first name", &new.first_name)?;
        validation::validate_name("last name", &new.last_name)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO authors (first_name, last_name, nationality, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(new.first_name.trim())
        .bind(new.last_name.trim())
        .bind(&new.nationality)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id = %id, "Author created");

        self.require(id).await
    }

    /// Applies a typed patch to an author.
    ///
    /// `None` fields are left unchanged; an empty patch returns the
    /// current record untouched.
    pub async fn update(&self, id: i64, patch: AuthorPatch) -> RepoResult<Author> {
        if patch.is_empty() {
            return self.require(id).await;
        }

        if let Some(first) = &patch.first_name {
            validation::validate_name("first name", first)?;
        }
        if let Some(last) = &patch.last_name {
            validation::validate_name("last name", last)?;
        }

        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE authors SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(first) = &patch.first_name {
            qb.push(", first_name = ").push_bind(first.trim());
        }
        if let Some(last) = &patch.last_name {
            qb.push(", last_name = ").push_bind(last.trim());
        }
        if let Some(nationality) = &patch.nationality {
            qb.push(", nationality = ").push_bind(nationality);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::AuthorNotFound(id).into());
        }

        self.require(id).await
    }

    /// Deletes an author. Blocked with HasDependents while books reference
    /// the author.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let author = sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::AuthorNotFound(id))?;

        let dependents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if dependents > 0 {
            return Err(CoreError::HasDependents {
                entity: format!("author '{}'", author.full_name()),
                dependents,
            }
            .into());
        }

        sqlx::query("DELETE FROM authors WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(id = %id, "Author deleted");
        Ok(())
    }

    /// Fetches an author that must exist.
    async fn require(&self, id: i64) -> RepoResult<Author> {
        self.get(id).await?.ok_or_else(|| CoreError::AuthorNotFound(id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::testutil::{seed_author, seed_book, test_db};

    #[tokio::test]
    async fn test_create_and_patch() {
        let db = test_db().await;
        let author = seed_author(&db).await;
        assert_eq!(author.full_name(), "Frank Herbert");

        let updated = db
            .authors()
            .update(
                author.id,
                AuthorPatch {
                    nationality: Some("US".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nationality.as_deref(), Some("US"));
        // Untouched fields survive the patch.
        assert_eq!(updated.last_name, "Herbert");
    }

    #[tokio::test]
    async fn test_update_missing_author_fails() {
        let db = test_db().await;
        let err = db
            .authors()
            .update(
                42,
                AuthorPatch {
                    first_name: Some("Nobody".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Core(CoreError::AuthorNotFound(42))));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_books_then_succeeds() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;

        let err = db.authors().delete(book.author_id).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::HasDependents { .. })
        ));

        db.books().delete(book.id).await.unwrap();
        db.authors().delete(book.author_id).await.unwrap();
        assert!(db.authors().get(book.author_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_matches_name_and_nationality() {
        let db = test_db().await;
        seed_author(&db).await;

        assert_eq!(db.authors().search("Herb").await.unwrap().len(), 1);
        assert_eq!(db.authors().search("American").await.unwrap().len(), 1);
        assert!(db.authors().search("zzz").await.unwrap().is_empty());
    }
}
