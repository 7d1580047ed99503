//! Job statistics save models (one row per client save).

use opstats_core::stats::{SaveRecord, SaveValues};
use opstats_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `job_stats_saves` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobStatsSave {
    pub id: DbId,
    /// `None` once the job has been deleted.
    pub job_id: Option<DbId>,
    pub annotator_id: DbId,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub system_tracked_time: Option<i32>,
    /// Objects annotated manually since the previous save.
    pub annotated_manually: i32,
    pub total_annotated_manually: i32,
    pub total_interpolated: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&JobStatsSave> for SaveRecord {
    fn from(save: &JobStatsSave) -> Self {
        SaveRecord {
            annotator_id: save.annotator_id,
            job_id: save.job_id,
            annotated_manually: save.annotated_manually,
            started_at: save.started_at,
            ended_at: save.ended_at,
            system_tracked_time: save.system_tracked_time,
            created_at: save.created_at,
        }
    }
}

/// DTO for inserting a save.
#[derive(Debug, Clone)]
pub struct CreateJobStatsSave {
    pub job_id: DbId,
    pub annotator_id: DbId,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub system_tracked_time: Option<i32>,
    pub annotated_manually: i32,
    pub total_annotated_manually: i32,
    pub total_interpolated: i32,
}

impl CreateJobStatsSave {
    /// Attach the authenticated annotator to planned save values.
    pub fn new(annotator_id: DbId, values: SaveValues) -> Self {
        Self {
            job_id: values.job_id,
            annotator_id,
            started_at: values.started_at,
            ended_at: values.ended_at,
            system_tracked_time: values.system_tracked_time,
            annotated_manually: values.annotated_manually,
            total_annotated_manually: values.total_annotated_manually,
            total_interpolated: values.total_interpolated,
        }
    }
}

/// A save joined with its annotator's display name, for the admin listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobStatsSaveListing {
    pub id: DbId,
    pub job_id: Option<DbId>,
    pub annotator_id: DbId,
    pub annotator_name: String,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub annotated_manually: i32,
    pub created_at: Timestamp,
}
