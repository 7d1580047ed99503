//! Calendar-date handling for statistics.
//!
//! Saves are grouped by the calendar date they fall on in a fixed display
//! offset, not in UTC.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeDelta};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Largest accepted display offset magnitude (just under 24h).
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Build a display offset from a minute count east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, CoreError> {
    if minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(CoreError::InvalidSetting {
            name: "STATS_UTC_OFFSET_MINUTES",
            reason: format!("{minutes} is outside +/-{MAX_OFFSET_MINUTES}"),
        });
    }
    FixedOffset::east_opt(minutes * 60).ok_or_else(|| CoreError::InvalidSetting {
        name: "STATS_UTC_OFFSET_MINUTES",
        reason: format!("{minutes} is not a valid offset"),
    })
}

/// The calendar date `ts` falls on in `offset`.
pub fn calendar_date(ts: Timestamp, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight starting `date` in `offset`.
fn local_midnight_utc(date: NaiveDate, offset: FixedOffset) -> Timestamp {
    let local = date.and_time(NaiveTime::MIN);
    (local - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Inclusive calendar-date filter. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, CoreError> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(CoreError::Validation(format!(
                    "'from' ({f}) must not be after 'to' ({t})"
                )));
            }
        }
        Ok(Self { from, to })
    }

    /// Half-open UTC bounds `[start, end)` covering the range in `offset`.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (Option<Timestamp>, Option<Timestamp>) {
        let start = self.from.map(|d| local_midnight_utc(d, offset));
        let end = self
            .to
            .and_then(|d| d.succ_opt())
            .map(|d| local_midnight_utc(d, offset));
        (start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}
