//! Repository for the `job_stats_saves` table.

use opstats_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::job_stats_save::{CreateJobStatsSave, JobStatsSave, JobStatsSaveListing};

/// Column list for `job_stats_saves` SELECT queries.
const COLUMNS: &str = "\
    id, job_id, annotator_id, started_at, ended_at, system_tracked_time, \
    annotated_manually, total_annotated_manually, total_interpolated, \
    created_at, updated_at";

/// Column list for INSERT (excludes auto-generated `id` and timestamps).
const INSERT_COLUMNS: &str = "\
    job_id, annotator_id, started_at, ended_at, system_tracked_time, \
    annotated_manually, total_annotated_manually, total_interpolated";

/// Provides append and query operations for statistics saves.
pub struct JobStatsSaveRepo;

impl JobStatsSaveRepo {
    /// Insert a save.
    ///
    /// Re-submitting the same (job, annotator, start) fails with a unique
    /// violation on `uq_job_stats_saves_job_annotator_started_at`.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateJobStatsSave,
    ) -> Result<JobStatsSave, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_stats_saves ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobStatsSave>(&query)
            .bind(input.job_id)
            .bind(input.annotator_id)
            .bind(input.started_at)
            .bind(input.ended_at)
            .bind(input.system_tracked_time)
            .bind(input.annotated_manually)
            .bind(input.total_annotated_manually)
            .bind(input.total_interpolated)
            .fetch_one(pool)
            .await
    }

    /// Most recent save of `annotator_id` on `job_id`.
    pub async fn latest_for(
        pool: &PgPool,
        job_id: DbId,
        annotator_id: DbId,
    ) -> Result<Option<JobStatsSave>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_stats_saves \
             WHERE job_id = $1 AND annotator_id = $2 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, JobStatsSave>(&query)
            .bind(job_id)
            .bind(annotator_id)
            .fetch_optional(pool)
            .await
    }

    /// All saves of the given annotators, oldest first.
    ///
    /// `from`/`to` bound the save's anchor instant (`started_at`, or
    /// `created_at` when no interval was reported) as `[from, to)`.
    pub async fn list_for_annotators(
        pool: &PgPool,
        annotator_ids: &[DbId],
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<JobStatsSave>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_stats_saves \
             WHERE annotator_id = ANY($1) \
               AND ($2::TIMESTAMPTZ IS NULL OR COALESCE(started_at, created_at) >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR COALESCE(started_at, created_at) < $3) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, JobStatsSave>(&query)
            .bind(annotator_ids)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Saves joined with the annotator's display name, newest first.
    pub async fn list_with_annotator(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JobStatsSaveListing>, sqlx::Error> {
        sqlx::query_as::<_, JobStatsSaveListing>(
            "SELECT s.id, s.job_id, s.annotator_id, \
                    COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), u.username) \
                        AS annotator_name, \
                    s.started_at, s.ended_at, s.annotated_manually, s.created_at \
             FROM job_stats_saves s \
             JOIN users u ON u.id = s.annotator_id \
             ORDER BY s.created_at DESC, s.id DESC \
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Number of saves recorded by an annotator.
    pub async fn count_for_annotator(
        pool: &PgPool,
        annotator_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM job_stats_saves WHERE annotator_id = $1")
                .bind(annotator_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
