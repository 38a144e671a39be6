//! # Fine Policy
//!
//! Pure computation of overdue fines.
//!
//! The fine is a step function of elapsed calendar days, not prorated by
//! time-of-day: returning at any time on the due date itself produces zero
//! fine; returning one calendar day late charges exactly one day's rate.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      Fine Computation                         │
//! │                                                               │
//! │  due_date = checkout date + loan period (default 14 days)     │
//! │                                                               │
//! │  days_late = max(0, returned_on - due_date)   [whole days]    │
//! │  fine      = days_late × FINE_RATE_PER_DAY                    │
//! │                                                               │
//! │  due day 10, returned day 10  →  0 days  →  $0.00             │
//! │  due day 10, returned day 13  →  3 days  →  $30.00            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Computed once at return time; the stored amount is immutable thereafter.

use chrono::{Duration, NaiveDate};

use crate::money::Money;

/// Default loan period when the caller does not override it.
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Fine charged per whole calendar day late.
pub const FINE_RATE_PER_DAY: Money = Money::from_cents(1000);

/// Computes the due date for a loan issued on `checkout_on`.
///
/// `period_days` must already be validated as positive (see
/// [`crate::validation::validate_loan_period`]).
pub fn due_date(checkout_on: NaiveDate, period_days: i64) -> NaiveDate {
    checkout_on + Duration::days(period_days)
}

/// Whole calendar days late; 0 if returned on or before the due date.
pub fn days_late(due: NaiveDate, returned_on: NaiveDate) -> i64 {
    (returned_on - due).num_days().max(0)
}

/// Fine owed for a loan due on `due` and returned on `returned_on`.
///
/// Monotonically non-decreasing in days late, exactly zero when not late.
pub fn fine_for(due: NaiveDate, returned_on: NaiveDate) -> Money {
    FINE_RATE_PER_DAY * days_late(due, returned_on)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_due_date_defaults_to_fourteen_days() {
        assert_eq!(due_date(day(1), DEFAULT_LOAN_PERIOD_DAYS), day(15));
    }

    #[test]
    fn test_on_time_return_is_free() {
        // Returning on the due date itself produces zero fine.
        assert_eq!(days_late(day(10), day(10)), 0);
        assert_eq!(fine_for(day(10), day(10)), Money::zero());
        // Early return too.
        assert_eq!(fine_for(day(10), day(5)), Money::zero());
    }

    #[test]
    fn test_three_days_late_charges_three_days() {
        assert_eq!(days_late(day(10), day(13)), 3);
        assert_eq!(fine_for(day(10), day(13)), Money::from_cents(3000));
    }

    #[test]
    fn test_one_day_late_charges_one_day() {
        assert_eq!(fine_for(day(10), day(11)), FINE_RATE_PER_DAY);
    }

    #[test]
    fn test_fine_is_monotonic_in_days_late() {
        let mut previous = Money::zero();
        for d in 5..25 {
            let fine = fine_for(day(10), day(d));
            assert!(fine >= previous);
            previous = fine;
        }
    }
}
