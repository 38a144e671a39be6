//! Shared fixtures for repository tests.
//!
//! Each test gets its own in-memory database, fully migrated, so tests
//! are isolated and need no cleanup.

use chrono::NaiveDate;

use crate::pool::{Database, DbConfig};
use biblio_core::{Author, Book, Category, NewAuthor, NewBook, NewCategory, NewPatron, Patron};

/// Fresh, migrated, in-memory database.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) async fn seed_author(db: &Database) -> Author {
    db.authors()
        .create(NewAuthor {
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            nationality: Some("American".to_string()),
        })
        .await
        .expect("seed author")
}

pub(crate) async fn seed_category(db: &Database, name: &str) -> Category {
    db.categories()
        .create(NewCategory {
            name: name.to_string(),
            description: None,
        })
        .await
        .expect("seed category")
}

/// Seeds a book (with its own author and category) holding `copies`
/// copies, all available.
pub(crate) async fn seed_book(db: &Database, title: &str, copies: i64) -> Book {
    let author = seed_author(db).await;
    let category = seed_category(db, &format!("Fiction/{title}")).await;

    db.books()
        .create(NewBook {
            title: title.to_string(),
            isbn: "978-0441013593".to_string(),
            author_id: author.id,
            category_id: category.id,
            publisher: Some("Ace".to_string()),
            pages: Some(412),
            description: None,
            total_copies: copies,
        })
        .await
        .expect("seed book")
}

pub(crate) async fn seed_patron(db: &Database, membership: &str) -> Patron {
    db.patrons()
        .create(NewPatron {
            membership_number: membership.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Reyes".to_string(),
            email: "ana.reyes@example.com".to_string(),
            phone: None,
            address: None,
        })
        .await
        .expect("seed patron")
}

/// Rewrites a loan's due date so overdue and fine paths are
/// deterministic under test.
pub(crate) async fn backdate_loan(db: &Database, loan_id: i64, due: NaiveDate) {
    sqlx::query("UPDATE loans SET due_date = ?2 WHERE id = ?1")
        .bind(loan_id)
        .bind(due)
        .execute(db.pool())
        .await
        .expect("backdate loan");
}
