//! Annotator productivity statistics.
//!
//! - [`ingest`] -- turns a client-reported save payload into the values to persist.
//! - [`intervals`] -- work-time arithmetic over save timestamps.
//! - [`aggregate`] -- groups saves by calendar date and job into productivity figures.
//! - [`range`] -- calendar-date filters and display offsets.

pub mod aggregate;
pub mod ingest;
pub mod intervals;
pub mod range;

pub use aggregate::{
    aggregate_saves, collect_operator_stats, daily_totals, AggregateOptions, DailyStats,
    DateOrder, DayTotal, JobAggregate, Operator, OperatorStats, SaveRecord,
};
pub use ingest::{plan_save, DeltaMode, SavePlan, SaveValues, StatsPayload};
pub use range::DateRange;

/// Seconds per hour (3600.0).
pub const SECS_PER_HOUR: f64 = 3600.0;

/// Default synthetic work time credited before the first save of a group
/// that carries no explicit interval.
pub const DEFAULT_LEAD_IN_MINUTES: i64 = 15;
