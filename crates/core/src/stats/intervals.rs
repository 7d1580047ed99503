//! Work-time arithmetic.

use chrono::TimeDelta;

use super::SECS_PER_HOUR;
use crate::types::Timestamp;

/// Length of an explicit work interval in whole seconds, never negative.
pub fn interval_secs(start: Timestamp, end: Timestamp) -> i64 {
    (end - start).num_seconds().max(0)
}

/// Sum the gaps between consecutive save times.
///
/// An extra `lead_in` is credited before the earliest timestamp so that the
/// work done before the first save of a session is not lost. Input order
/// does not matter.
pub fn sum_intervals(timestamps: &[Timestamp], lead_in: TimeDelta) -> TimeDelta {
    let mut sorted = timestamps.to_vec();
    sorted.sort();

    let Some(first) = sorted.first() else {
        return TimeDelta::zero();
    };

    let mut previous = *first - lead_in;
    let mut total = TimeDelta::zero();
    for ts in sorted {
        total += ts - previous;
        previous = ts;
    }
    total
}

/// Round to two decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seconds expressed as hours, rounded to two decimals.
pub fn hours(secs: i64) -> f64 {
    round2(secs as f64 / SECS_PER_HOUR)
}

/// Boxes per hour of work. Zero when no time was recorded.
pub fn boxes_per_hour(boxes: i64, secs: i64) -> f64 {
    if secs <= 0 {
        return 0.0;
    }
    round2(boxes as f64 * SECS_PER_HOUR / secs as f64)
}
