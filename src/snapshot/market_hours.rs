//! Regular-trading-hours gate.
//!
//! Monday to Friday, 09:30 to 16:00 local exchange time, both ends
//! inclusive. Exchange holidays are not modelled.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone};

/// Session open, local time.
pub const RTH_OPEN: (u32, u32) = (9, 30);

/// Session close, local time.
pub const RTH_CLOSE: (u32, u32) = (16, 0);

fn session_bound((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Whether `as_of` falls inside the regular session in its own timezone.
#[must_use]
pub fn is_regular_trading_hours<Tz: TimeZone>(as_of: &DateTime<Tz>) -> bool {
    if as_of.weekday().num_days_from_monday() >= 5 {
        return false;
    }
    let time = as_of.time();
    time >= session_bound(RTH_OPEN) && time <= session_bound(RTH_CLOSE)
}
