//! # Repository Module
//!
//! Database repository implementations for Biblio.
//!
//! ## Repository Pattern
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                         │
//! │                                                               │
//! │  Console menu                                                 │
//! │       │                                                       │
//! │       │  db.loans().checkout(book_id, patron_id, 14)          │
//! │       ▼                                                       │
//! │  LoanRepository                                               │
//! │  ├── checkout(&self, book_id, patron_id, days)                │
//! │  ├── return_loan(&self, loan_id)                              │
//! │  └── list_outstanding(&self) / list_overdue(&self)            │
//! │       │                                                       │
//! │       │  one scoped transaction per operation                 │
//! │       ▼                                                       │
//! │  SQLite Database                                              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories are stateless: each holds only a pool handle and every
//! operation acquires and releases its own connection or transaction.
//!
//! ## Available Repositories
//!
//! - [`author::AuthorRepository`] - Author CRUD and search
//! - [`category::CategoryRepository`] - Category CRUD with name uniqueness
//! - [`book::BookRepository`] - Book CRUD, search, availability
//! - [`patron::PatronRepository`] - Patron CRUD and status toggling
//! - [`loan::LoanRepository`] - The loan lifecycle and fines

pub mod author;
pub mod book;
pub mod category;
pub mod loan;
pub mod patron;
