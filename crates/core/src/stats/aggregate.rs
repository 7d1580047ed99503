//! Aggregation of saves into per-operator, per-date, per-job figures.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, Offset, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::intervals::{boxes_per_hour, hours, interval_secs, sum_intervals};
use super::range::{calendar_date, DateRange};
use super::DEFAULT_LEAD_IN_MINUTES;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The columns of a stored save that aggregation needs.
#[derive(Debug, Clone)]
pub struct SaveRecord {
    pub annotator_id: DbId,
    /// `None` once the job has been deleted.
    pub job_id: Option<DbId>,
    pub annotated_manually: i32,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub system_tracked_time: Option<i32>,
    pub created_at: Timestamp,
}

impl SaveRecord {
    /// Instant that decides which calendar date the save counts toward.
    pub fn anchor(&self) -> Timestamp {
        self.started_at.unwrap_or(self.created_at)
    }

    fn explicit_interval(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(interval_secs(start, end)),
            _ => None,
        }
    }
}

/// A user whose statistics are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: DbId,
    pub username: String,
    pub full_name: String,
}

/// Order of the date keys in [`DailyStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// Most recent date first.
    #[default]
    Descending,
    /// Dates in the order they were first seen, i.e. chronological.
    Insertion,
}

impl FromStr for DateOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desc" | "descending" => Ok(Self::Descending),
            "insertion" => Ok(Self::Insertion),
            other => Err(CoreError::InvalidSetting {
                name: "STATS_DATE_ORDER",
                reason: format!("expected 'desc' or 'insertion', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Offset used to turn timestamps into calendar dates.
    pub offset: FixedOffset,
    /// Time credited before the first save of a group without explicit intervals.
    pub lead_in: TimeDelta,
    pub date_order: DateOrder,
    /// Dates outside this range are dropped.
    pub range: DateRange,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            lead_in: TimeDelta::minutes(DEFAULT_LEAD_IN_MINUTES),
            date_order: DateOrder::default(),
            range: DateRange::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Work on one job during one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobAggregate {
    pub job: Option<DbId>,
    /// Work time in seconds.
    pub time: i64,
    pub hours: f64,
    pub boxes_count: i64,
    /// Sum of client-tracked seconds.
    pub tracked_time: i64,
    /// Boxes per hour.
    pub ratio: f64,
    pub saves: usize,
}

/// All jobs of one calendar date combined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub jobs: usize,
    pub time: i64,
    pub hours: f64,
    pub boxes_count: i64,
    pub ratio: f64,
}

/// date -> per-job aggregates, in the configured [`DateOrder`].
pub type DailyStats = IndexMap<NaiveDate, Vec<JobAggregate>>;

#[derive(Debug, Clone, Serialize)]
pub struct OperatorStats {
    pub id: DbId,
    pub name: String,
    pub full_name: String,
    pub stats: DailyStats,
    pub daily: Vec<DayTotal>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct JobAccumulator {
    explicit_secs: i64,
    save_times: Vec<Timestamp>,
    boxes: i64,
    tracked: i64,
    saves: usize,
}

impl JobAccumulator {
    fn add(&mut self, save: &SaveRecord) {
        match save.explicit_interval() {
            Some(secs) => self.explicit_secs += secs,
            None => self.save_times.push(save.created_at),
        }
        self.boxes += i64::from(save.annotated_manually);
        self.tracked += i64::from(save.system_tracked_time.unwrap_or(0));
        self.saves += 1;
    }

    fn finish(self, job: Option<DbId>, lead_in: TimeDelta) -> JobAggregate {
        let time = self.explicit_secs + sum_intervals(&self.save_times, lead_in).num_seconds();
        JobAggregate {
            job,
            time,
            hours: hours(time),
            boxes_count: self.boxes,
            tracked_time: self.tracked,
            ratio: boxes_per_hour(self.boxes, time),
            saves: self.saves,
        }
    }
}

/// Group one operator's saves by calendar date, then by job.
///
/// Jobs within a date keep the order of their first save.
pub fn aggregate_saves(saves: &[SaveRecord], opts: &AggregateOptions) -> DailyStats {
    let mut ordered: Vec<&SaveRecord> = saves.iter().collect();
    ordered.sort_by_key(|s| s.anchor());

    let mut grouped: IndexMap<NaiveDate, IndexMap<Option<DbId>, JobAccumulator>> = IndexMap::new();
    for save in ordered {
        let date = calendar_date(save.anchor(), opts.offset);
        if !opts.range.contains(date) {
            continue;
        }
        grouped
            .entry(date)
            .or_default()
            .entry(save.job_id)
            .or_default()
            .add(save);
    }

    let mut stats: DailyStats = grouped
        .into_iter()
        .map(|(date, jobs)| {
            let aggregates = jobs
                .into_iter()
                .map(|(job, acc)| acc.finish(job, opts.lead_in))
                .collect();
            (date, aggregates)
        })
        .collect();

    if opts.date_order == DateOrder::Descending {
        stats.sort_by(|a, _, b, _| b.cmp(a));
    }
    stats
}

/// Per-date totals across jobs, in the same order as `stats`.
pub fn daily_totals(stats: &DailyStats) -> Vec<DayTotal> {
    stats
        .iter()
        .map(|(date, jobs)| {
            let time: i64 = jobs.iter().map(|j| j.time).sum();
            let boxes_count: i64 = jobs.iter().map(|j| j.boxes_count).sum();
            DayTotal {
                date: *date,
                jobs: jobs.len(),
                time,
                hours: hours(time),
                boxes_count,
                ratio: boxes_per_hour(boxes_count, time),
            }
        })
        .collect()
}

/// Build the user -> statistics mapping for `operators`.
///
/// Every operator appears in the result, in the given order, even when no
/// saves belong to them. Saves of users not listed are ignored.
pub fn collect_operator_stats(
    operators: &[Operator],
    saves: &[SaveRecord],
    opts: &AggregateOptions,
) -> IndexMap<DbId, OperatorStats> {
    let mut by_annotator: HashMap<DbId, Vec<SaveRecord>> = HashMap::new();
    for save in saves {
        by_annotator
            .entry(save.annotator_id)
            .or_default()
            .push(save.clone());
    }

    operators
        .iter()
        .map(|op| {
            let stats = by_annotator
                .get(&op.id)
                .map(|own| aggregate_saves(own, opts))
                .unwrap_or_default();
            let daily = daily_totals(&stats);
            (
                op.id,
                OperatorStats {
                    id: op.id,
                    name: op.username.clone(),
                    full_name: op.full_name.clone(),
                    stats,
                    daily,
                },
            )
        })
        .collect()
}
