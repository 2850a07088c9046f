//! Expiration selection by target days-to-expiration.
//!
//! DTE distance is measured in whole calendar days, not trading days.

use chrono::{Days, NaiveDate};

/// Calendar date `target_dte` days after `as_of`.
#[must_use]
pub fn target_date(as_of: NaiveDate, target_dte: u32) -> NaiveDate {
    as_of
        .checked_add_days(Days::new(u64::from(target_dte)))
        .unwrap_or(NaiveDate::MAX)
}

/// Absolute distance in calendar days between two dates.
#[must_use]
pub fn day_distance(a: NaiveDate, b: NaiveDate) -> u64 {
    (a - b).num_days().unsigned_abs()
}

/// Picks the expiration nearest to `as_of + target_dte` within `tolerance_days`.
///
/// Ties on distance go to the first candidate in input order, which is the
/// earliest date for a sorted input. Returns `None` when nothing lies within
/// tolerance.
#[must_use]
pub fn select_expiration(
    expirations: &[NaiveDate],
    target_dte: u32,
    as_of: NaiveDate,
    tolerance_days: u32,
) -> Option<NaiveDate> {
    let target = target_date(as_of, target_dte);
    expirations
        .iter()
        .copied()
        .filter(|e| day_distance(*e, target) <= u64::from(tolerance_days))
        .min_by_key(|e| day_distance(*e, target))
}

/// Picks the expiration nearest to `as_of + target_dte`, ignoring tolerance.
///
/// Only returns `None` for an empty input. Used by forced runs.
#[must_use]
pub fn select_closest(
    expirations: &[NaiveDate],
    target_dte: u32,
    as_of: NaiveDate,
) -> Option<NaiveDate> {
    let target = target_date(as_of, target_dte);
    expirations
        .iter()
        .copied()
        .min_by_key(|e| day_distance(*e, target))
}
