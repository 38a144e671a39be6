//! # biblio-core: Pure Domain Logic for Biblio
//!
//! This crate is the heart of the catalog. It contains the domain types
//! and business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Biblio Architecture                       │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                 apps/console (menus)                    │  │
//! │  └──────────────────────────┬──────────────────────────────┘  │
//! │                             │                                 │
//! │  ┌──────────────────────────▼──────────────────────────────┐  │
//! │  │             ★ biblio-core (THIS CRATE) ★                │  │
//! │  │                                                         │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────────┐     │  │
//! │  │  │  types  │ │  money  │ │  fine   │ │ validation │     │  │
//! │  │  │  Book   │ │  Money  │ │  policy │ │   rules    │     │  │
//! │  │  │  Loan   │ │  cents  │ │  rates  │ │   checks   │     │  │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └────────────┘     │  │
//! │  │                                                         │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS     │  │
//! │  └──────────────────────────┬──────────────────────────────┘  │
//! │                             │                                 │
//! │  ┌──────────────────────────▼──────────────────────────────┐  │
//! │  │             biblio-db (SQLite repositories)             │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Patron, Loan, patches)
//! - [`money`] - Money type with integer arithmetic (no floating point)
//! - [`fine`] - Overdue fine policy
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation
//!
//! ## Example
//!
//! ```rust
//! use biblio_core::fine::{fine_for, FINE_RATE_PER_DAY};
//! use biblio_core::money::Money;
//! use chrono::NaiveDate;
//!
//! let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
//! let returned = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
//!
//! // 3 days late at $10.00/day
//! assert_eq!(fine_for(due, returned), Money::from_cents(3000));
//! assert_eq!(FINE_RATE_PER_DAY.cents(), 1000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fine;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use fine::{DEFAULT_LOAN_PERIOD_DAYS, FINE_RATE_PER_DAY};
pub use money::Money;
pub use types::*;
