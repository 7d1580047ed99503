//! Planning of a single save submitted by the annotation client.
//!
//! The client posts whatever counters it has on every save. Two accounting
//! modes exist:
//!
//! - [`DeltaMode::Derived`]: the client reports cumulative totals only and
//!   the per-save delta is the difference to the previous save of the same
//!   (job, annotator).
//! - [`DeltaMode::Reported`]: the client reports the delta itself along
//!   with the work interval (`start`/`end`) and its own tracked time.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Delta mode
// ---------------------------------------------------------------------------

/// How the `annotated_manually` delta of a save is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    /// Delta is sent by the client.
    #[default]
    Reported,
    /// Delta is computed from the previous save's cumulative total.
    Derived,
}

impl DeltaMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::Derived => "derived",
        }
    }

    /// Whether planning a save requires the previous save's total.
    pub fn needs_previous_save(self) -> bool {
        matches!(self, Self::Derived)
    }
}

impl FromStr for DeltaMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reported" => Ok(Self::Reported),
            "derived" => Ok(Self::Derived),
            other => Err(CoreError::InvalidSetting {
                name: "STATS_DELTA_MODE",
                reason: format!("expected 'reported' or 'derived', got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for DeltaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Counters and timestamps the client may attach to a save. Every field is
/// optional; an all-empty payload is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatsPayload {
    /// Objects annotated manually since the previous save.
    pub annotated_manually: Option<i32>,
    /// Cumulative manually annotated objects on the job.
    #[serde(alias = "manually")]
    pub total_annotated_manually: Option<i32>,
    /// Cumulative interpolated objects on the job.
    #[serde(alias = "interpolated")]
    pub total_interpolated: Option<i32>,
    #[serde(rename = "start")]
    pub started_at: Option<Timestamp>,
    #[serde(rename = "end")]
    pub ended_at: Option<Timestamp>,
    /// Active seconds tracked by the client itself.
    pub system_tracked_time: Option<i32>,
}

impl StatsPayload {
    pub fn is_empty(&self) -> bool {
        self.annotated_manually.is_none()
            && self.total_annotated_manually.is_none()
            && self.total_interpolated.is_none()
            && self.started_at.is_none()
            && self.ended_at.is_none()
            && self.system_tracked_time.is_none()
    }

    /// Reject values no client can legitimately produce.
    ///
    /// Deltas may be negative (objects deleted since the last save);
    /// cumulative totals and tracked time may not.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let (Some(start), Some(end)) = (self.started_at, self.ended_at) {
            if end < start {
                return Err(CoreError::Validation(
                    "end must not be earlier than start".into(),
                ));
            }
        }
        for (name, value) in [
            ("total_annotated_manually", self.total_annotated_manually),
            ("total_interpolated", self.total_interpolated),
            ("system_tracked_time", self.system_tracked_time),
        ] {
            if matches!(value, Some(v) if v < 0) {
                return Err(CoreError::Validation(format!("{name} must not be negative")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Values ready to be written as a new save row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveValues {
    pub job_id: DbId,
    pub annotated_manually: i32,
    pub total_annotated_manually: i32,
    pub total_interpolated: i32,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub system_tracked_time: Option<i32>,
}

/// Outcome of [`plan_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePlan {
    /// Nothing was sent.
    Empty,
    /// A field required by the active mode is missing; nothing is stored.
    Incomplete { missing: &'static str },
    Persist(SaveValues),
}

/// Decide what, if anything, to persist for a save.
///
/// `previous_total` is the `total_annotated_manually` of the latest earlier
/// save for the same (job, annotator), and is only consulted in
/// [`DeltaMode::Derived`].
pub fn plan_save(
    mode: DeltaMode,
    job_id: Option<DbId>,
    payload: &StatsPayload,
    previous_total: Option<i32>,
) -> Result<SavePlan, CoreError> {
    if payload.is_empty() {
        return Ok(SavePlan::Empty);
    }
    payload.validate()?;

    let Some(job_id) = job_id else {
        return Ok(SavePlan::Incomplete { missing: "job" });
    };
    let Some(total_annotated_manually) = payload.total_annotated_manually else {
        return Ok(SavePlan::Incomplete {
            missing: "total_annotated_manually",
        });
    };
    let Some(total_interpolated) = payload.total_interpolated else {
        return Ok(SavePlan::Incomplete {
            missing: "total_interpolated",
        });
    };

    let annotated_manually = match mode {
        DeltaMode::Derived => {
            total_annotated_manually.saturating_sub(previous_total.unwrap_or(0))
        }
        DeltaMode::Reported => match payload.annotated_manually {
            Some(delta) => delta,
            None => {
                return Ok(SavePlan::Incomplete {
                    missing: "annotated_manually",
                })
            }
        },
    };

    Ok(SavePlan::Persist(SaveValues {
        job_id,
        annotated_manually,
        total_annotated_manually,
        total_interpolated,
        started_at: payload.started_at,
        ended_at: payload.ended_at,
        system_tracked_time: payload.system_tracked_time,
    }))
}
