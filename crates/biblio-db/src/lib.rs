//! # biblio-db: Database Layer for Biblio
//!
//! This crate provides database access for the Biblio catalog.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Biblio Data Flow                         │
//! │                                                               │
//! │  Console menu (checkout, return, CRUD)                        │
//! │       │                                                       │
//! │       ▼                                                       │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                 biblio-db (THIS CRATE)                  │  │
//! │  │                                                         │  │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌───────────────┐    │  │
//! │  │  │  Database  │  │ Repositories │  │  Migrations   │    │  │
//! │  │  │ (pool.rs)  │◄─│ author, book │  │  (embedded)   │    │  │
//! │  │  │            │  │ category,    │  │ 001_init.sql  │    │  │
//! │  │  │ SqlitePool │  │ patron, loan │  │               │    │  │
//! │  │  └────────────┘  └──────────────┘  └───────────────┘    │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │       │                                                       │
//! │       ▼                                                       │
//! │  SQLite database file (WAL mode)                              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and repository error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use biblio_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/biblio.db")).await?;
//!
//! let receipt = db.loans().checkout(book_id, patron_id, 14).await?;
//! println!("{}", receipt.message);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, RepoError, RepoResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::author::AuthorRepository;
pub use repository::book::BookRepository;
pub use repository::category::CategoryRepository;
pub use repository::loan::{CheckoutReceipt, LoanRecord, LoanRepository, ReturnReceipt};
pub use repository::patron::PatronRepository;
