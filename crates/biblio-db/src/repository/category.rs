//! # Category Repository
//!
//! Database operations for categories.
//!
//! Category names are unique. The uniqueness check is a case-sensitive
//! exact match (`=` under SQLite's default BINARY collation), performed
//! before commit so the caller gets a DuplicateName business error rather
//! than a raw constraint violation; the UNIQUE column backs it up.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::RepoResult;
use biblio_core::{validation, Category, CategoryPatch, CoreError, NewCategory};

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories, ordered by name.
    pub async fn list(&self) -> RepoResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get(&self, id: i64) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Searches categories by name (substring match).
    pub async fn search(&self, term: &str) -> RepoResult<Vec<Category>> {
        debug!(term = %term, "Searching categories");

        let pattern = format!("%{}%", term.trim());
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name LIKE ?1 ORDER BY name"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Creates a category, enforcing name uniqueness.
    pub async fn create(&self, new: NewCategory) -> RepoResult<Category> {
        validation::validate_name("name", &new.name)?;
        let name = new.name.trim().to_string();

        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = ?1")
            .bind(&name)
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Err(CoreError::DuplicateName { name }.into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(&name)
        .bind(&new.description)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let id = result.last_insert_rowid();
        debug!(id = %id, name = %name, "Category created");

        self.require(id).await
    }

    /// Applies a typed patch to a category, re-checking name uniqueness
    /// when the name changes.
    pub async fn update(&self, id: i64, patch: CategoryPatch) -> RepoResult<Category> {
        if patch.is_empty() {
            return self.require(id).await;
        }

        let mut tx = self.pool.begin().await?;

        if let Some(name) = &patch.name {
            validation::validate_name("name", name)?;
            let clash: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM categories WHERE name = ?1 AND id != ?2",
            )
            .bind(name.trim())
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if clash > 0 {
                return Err(CoreError::DuplicateName {
                    name: name.trim().to_string(),
                }
                .into());
            }
        }

        let mut qb = sqlx::QueryBuilder::<sqlx::Sqlite>::new("UPDATE categories SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.trim());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::CategoryNotFound(id).into());
        }
        tx.commit().await?;

        self.require(id).await
    }

    /// Deletes a category. Blocked with HasDependents while books
    /// reference the category.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::CategoryNotFound(id))?;

        let dependents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if dependents > 0 {
            return Err(CoreError::HasDependents {
                entity: format!("category '{}'", category.name),
                dependents,
            }
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(id = %id, "Category deleted");
        Ok(())
    }

    /// Fetches a category that must exist.
    async fn require(&self, id: i64) -> RepoResult<Category> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use crate::testutil::{seed_book, test_db};

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;

        db.categories()
            .create(NewCategory {
                name: "Fiction".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let err = db
            .categories()
            .create(NewCategory {
                name: "Fiction".to_string(),
                description: Some("again".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::DuplicateName { .. })
        ));

        // Uniqueness is case-sensitive: a different casing is a new name.
        db.categories()
            .create(NewCategory {
                name: "fiction".to_string(),
                description: None,
            })
            .await
            .expect("different casing is allowed");
    }

    #[tokio::test]
    async fn test_update_checks_uniqueness_against_others_only() {
        let db = test_db().await;

        let fiction = db
            .categories()
            .create(NewCategory {
                name: "Fiction".to_string(),
                description: None,
            })
            .await
            .unwrap();
        db.categories()
            .create(NewCategory {
                name: "Poetry".to_string(),
                description: None,
            })
            .await
            .unwrap();

        // Renaming a category to its own name is fine.
        db.categories()
            .update(
                fiction.id,
                CategoryPatch {
                    name: Some("Fiction".to_string()),
                    description: Some("made-up stories".to_string()),
                },
            )
            .await
            .expect("same-name rename allowed");

        // Renaming onto another category is not.
        let err = db
            .categories()
            .update(
                fiction.id,
                CategoryPatch {
                    name: Some("Poetry".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::DuplicateName { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_books_then_succeeds() {
        let db = test_db().await;
        let book = seed_book(&db, "Dune", 1).await;

        let err = db.categories().delete(book.category_id).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Core(CoreError::HasDependents { dependents: 1, .. })
        ));

        db.books().delete(book.id).await.unwrap();
        db.categories().delete(book.category_id).await.unwrap();

        // The record becomes unfetchable by id afterward.
        assert!(db.categories().get(book.category_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_substring_match() {
        let db = test_db().await;
        for name in ["Science Fiction", "Historical Fiction", "Poetry"] {
            db.categories()
                .create(NewCategory {
                    name: name.to_string(),
                    description: None,
                })
                .await
                .unwrap();
        }

        let hits = db.categories().search("Fiction").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(db.categories().search("nope").await.unwrap().is_empty());
    }
}
