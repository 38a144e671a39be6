//! # Book Repository
//!
//! Database operations for books.
//!
//! ## Copy Accounting
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Copy Accounting                           │
//! │                                                               │
//! │  0 <= available_copies <= total_copies, always                │
//! │                                                               │
//! │  create          → available = total                          │
//! │  total_copies ±N → available shifts by the same delta, so     │
//! │                    outstanding loans stay accounted for       │
//! │  checkout/return → handled ONLY by the loan repository        │
//! │                                                               │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::RepoResult;
use biblio_core::{validation, Book, BookPatch, CoreError, NewBook, ValidationError};

const BOOK_COLUMNS: &str = "id, title, isbn, author_id, category_id, publisher, pages, \
     description, total_copies, available_copies, created_at, updated_at";

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists all books, ordered by title.
    pub async fn list(&self) -> RepoResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Lists books with at least one available copy.
    pub async fn list_available(&self) -> RepoResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE available_copies > 0 ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Gets a book by ID.
    pub async fn get(&self, id: i64) -> RepoResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Searches books by title or ISBN (substring match).
    pub async fn search(&self, term: &str) -> RepoResult<Vec<Book>> {
        debug!(term = %term, "Searching books");

        let pattern = format!("%{}%", term.trim());
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books
             WHERE title LIKE ?1 OR isbn LIKE ?1
             ORDER BY title"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Creates a book. All copies start available.
    pub async fn create(&self, new: NewBook) -> RepoResult<Book> {
        validation::validate_title(&new.title)?;
        validation::validate_isbn(&new.isbn)?;
        validation::validate_copies(new.total_copies)?;

        let mut tx = self.pool.begin().await?;

        // Typed errors beat raw FK violations at the console.
        let author_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ?1")
            .bind(new.author_id)
            .fetch_one(&mut *tx)
            .await?;
        if author_exists == 0 {
            return Err(CoreError::AuthorNotFound(new.author_id).into());
        }

        let category_exists: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?1")
                .bind(new.category_id)
                .fetch_one(&mut *tx)
                .await?;
        if category_exists == 0 {
            return Err(CoreError::CategoryNotFound(new.category_id).into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO books (title, isbn, author_id, category_id, publisher, pages, \
             description, total_copies, available_copies, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, ?9)",
        )
        .bind(new.title.trim())
        .bind(new.isbn.trim())
        .bind(new.author_id)
        .bind(new.category_id)
        .bind(&new.publisher)
        .bind(new.pages)
        .bind(&new.description)
        .bind(new.total_copies)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let id = result.last_insert_rowid();
        debug!(id = %id, title = %new.title, "Book created");

        self.require(id).await
    }

    /// Applies a typed patch to a book.
    ///
    /// A `total_copies` change shifts `available_copies` by the same
    /// delta; shrinking below the number of copies currently on loan is
    /// rejected.
    pub async fn update(&self, id: i64, patch: BookPatch) -> RepoResult<Book> {
        if patch.is_empty() {
            return self.require(id).await;
        }

        if let Some(title) = &patch.title {
            validation::validate_title(title)?;
        }
        if let Some(isbn) = &patch.isbn {
            validation::validate_isbn(isbn)?;
        }
        if let Some(total) = patch.total_copies {
            validation::validate_copies(total)?;
        }

        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::BookNotFound(id))?;

        if let Some(author_id) = patch.author_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ?1")
                .bind(author_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(CoreError::AuthorNotFound(author_id).into());
            }
        }
        if let Some(category_id) = patch.category_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?1")
                .bind(category_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(CoreError::CategoryNotFound(category_id).into());
            }
        }

        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE books SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(title) = &patch.title {
            qb.push(", title = ").push_bind(title.trim());
        }
        if let Some(isbn) = &patch.isbn {
            qb.push(", isbn = ").push_bind(isbn.trim());
        }
        if let Some(author_id) = patch.author_id {
            qb.push(", author_id = ").push_bind(author_id);
        }
        if let Some(category_id) = patch.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        if let Some(publisher) = &patch.publisher {
            qb.push(", publisher = ").push_bind(publisher);
        }
        if let Some(pages) = patch.pages {
            qb.push(", pages = ").push_bind(pages);
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(total) = patch.total_copies {
            let on_loan = book.total_copies - book.available_copies;
            let new_available = total - on_loan;
            if new_available < 0 {
                return Err(ValidationError::TooSmall {
                    field: "total copies".to_string(),
                    min: on_loan,
                }
                .into());
            }
            qb.push(", total_copies = ").push_bind(total);
            qb.push(", available_copies = ").push_bind(new_available);
        }
        qb.push(" WHERE id = ").push_bind(id);

        qb.build().execute(&mut *tx).await?;
        tx.commit().await?;

        self.require(id).await
    }

    /// Deletes a book. Blocked with HasDependents while loans (of any
    /// status) reference the book; loans are never deleted, so a borrowed
    /// book keeps its history.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::BookNotFound(id))?;

        let dependents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if dependents > 0 {
            return Err(CoreError::HasDependents {
                entity: format!("book '{}'", book.title),
                dependents,
            }
            .into());
        }

        sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(id = %id, "Book deleted");
        Ok(())
    }

    /// Fetches a book that must exist.
    async fn require(&self, id: i64) -> RepoResult<Book> {
        self.get(id).await?.ok_or_else(|| CoreError::BookNotFound(id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::testutil::{seed_book, seed_patron, test_db};

    #[tokio::test]
    async fn test_create_starts_fully_available() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 3).await;
        assert_eq!(book.total_copies, 3);
        assert_eq!(book.available_copies, 3);
        assert!(book.is_available());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_references() {
        let db = test_db().await;
        let existing = seed_book(&db, "Dune", 1).await;

        let err = db
            .books()
            .create(NewBook {
                title: "Ghost".to_string(),
                isbn: "123".to_string(),
                author_id: 999,
                category_id: existing.category_id,
                publisher: None,
                pages: None,
                description: None,
                total_copies: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Core(CoreError::AuthorNotFound(999))));
    }

    #[tokio::test]
    async fn test_total_copies_patch_shifts_available() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 2).await;
        let patron = seed_patron(&db, "LIB-0001").await;
        db.loans().checkout(book.id, patron.id, 14).await.unwrap();

        // 2 total / 1 available / 1 on loan. Growing to 5 keeps the loan
        // accounted for: 5 total / 4 available.
        let grown = db
            .books()
            .update(
                book.id,
                BookPatch {
                    total_copies: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(grown.total_copies, 5);
        assert_eq!(grown.available_copies, 4);

        // Shrinking below the on-loan count is rejected.
        let err = db
            .books()
            .update(
                book.id,
                BookPatch {
                    total_copies: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_loans_then_succeeds() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;
        let receipt = db.loans().checkout(book.id, patron.id, 14).await.unwrap();

        let err = db.books().delete(book.id).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::HasDependents { dependents: 1, .. })
        ));

        // Even a returned loan keeps the history pinned.
        db.loans().return_loan(receipt.loan_id).await.unwrap();
        let err = db.books().delete(book.id).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::HasDependents { .. })
        ));

        let fresh = seed_book(&db, "Hyperion", 1).await;
        db.books().delete(fresh.id).await.unwrap();
        assert!(db.books().get(fresh.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_available_excludes_exhausted() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;
        let patron = seed_patron(&db, "LIB-0001").await;

        assert_eq!(db.books().list_available().await.unwrap().len(), 1);
        db.loans().checkout(book.id, patron.id, 14).await.unwrap();
        assert!(db.books().list_available().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_title_and_isbn() {
        let db = test_db().await;
        seed_book(&db, "Dune", 1).await;

        assert_eq!(db.books().search("dun").await.unwrap().len(), 1);
        assert_eq!(db.books().search("0441").await.unwrap().len(), 1);
        assert!(db.books().search("tolstoy").await.unwrap().is_empty());
    }
}
