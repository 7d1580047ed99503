//! Handlers for annotator statistics: recording saves and reading
//! per-operator productivity.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use opstats_core::error::CoreError;
use opstats_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use opstats_core::stats::{
    collect_operator_stats, plan_save, Operator, OperatorStats, SavePlan, SaveRecord,
    StatsPayload,
};
use opstats_core::types::{DbId, Timestamp};
use opstats_db::models::job_stats_save::{CreateJobStatsSave, JobStatsSave};
use opstats_db::models::user::User;
use opstats_db::repositories::{JobStatsSaveRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{DateRangeParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Statistics keyed by user id, in user id order.
pub type StatsByOperator = IndexMap<DbId, OperatorStats>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /stats/saves`.
#[derive(Debug, Deserialize)]
pub struct SaveStatsRequest {
    pub job: Option<DbId>,
    #[serde(flatten)]
    pub payload: StatsPayload,
}

/// One row of the admin save listing.
#[derive(Debug, Serialize)]
pub struct SaveListingItem {
    pub id: DbId,
    pub job_id: Option<DbId>,
    pub annotator_id: DbId,
    pub annotator_name: String,
    /// Interval start in the display offset.
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub annotated_manually: i32,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Recording saves
// ---------------------------------------------------------------------------

/// POST /api/v1/stats/saves
///
/// Record the counters sent with an annotation save. Always answers 201;
/// `data` is `null` when nothing was stored.
pub async fn record_save(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SaveStatsRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Option<JobStatsSave>>>)> {
    let saved = persist_save(&state, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: saved })))
}

async fn persist_save(
    state: &AppState,
    annotator_id: DbId,
    input: &SaveStatsRequest,
) -> AppResult<Option<JobStatsSave>> {
    let mode = state.config.stats.delta_mode;

    let previous_total = match input.job {
        Some(job_id) if mode.needs_previous_save() && !input.payload.is_empty() => {
            JobStatsSaveRepo::latest_for(&state.pool, job_id, annotator_id)
                .await?
                .map(|save| save.total_annotated_manually)
        }
        _ => None,
    };

    let values = match plan_save(mode, input.job, &input.payload, previous_total)? {
        SavePlan::Empty => return Ok(None),
        SavePlan::Incomplete { missing } => {
            tracing::debug!(
                annotator_id,
                job_id = ?input.job,
                missing,
                %mode,
                "Incomplete stats payload, nothing saved"
            );
            return Ok(None);
        }
        SavePlan::Persist(values) => values,
    };

    let create = CreateJobStatsSave::new(annotator_id, values);
    match JobStatsSaveRepo::insert(&state.pool, &create).await {
        Ok(save) => {
            tracing::info!(
                save_id = save.id,
                job_id = create.job_id,
                annotator_id,
                annotated_manually = save.annotated_manually,
                "Recorded job stats save"
            );
            Ok(Some(save))
        }
        Err(e) if opstats_db::is_integrity_violation(&e) => {
            tracing::warn!(
                error = %e,
                job_id = create.job_id,
                annotator_id,
                "Job stats save rejected by the database, ignoring"
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Admin listing
// ---------------------------------------------------------------------------

/// GET /api/v1/stats/saves?limit=&offset=
///
/// Raw saves, newest first. Admin only.
pub async fn list_saves(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<SaveListingItem>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);
    let display = state.config.stats.utc_offset;

    let items = JobStatsSaveRepo::list_with_annotator(&state.pool, limit, offset)
        .await?
        .into_iter()
        .map(|row| SaveListingItem {
            id: row.id,
            job_id: row.job_id,
            annotator_id: row.annotator_id,
            annotator_name: row.annotator_name,
            start: row.started_at.map(|t| t.with_timezone(&display)),
            end: row.ended_at.map(|t| t.with_timezone(&display)),
            annotated_manually: row.annotated_manually,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// Reading statistics
// ---------------------------------------------------------------------------

/// GET /api/v1/stats?from=&to=
///
/// Superusers see every user; everyone else sees only themselves.
pub async fn get_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DateRangeParams>,
) -> AppResult<Json<DataResponse<StatsByOperator>>> {
    let users = if auth.is_admin() {
        UserRepo::list(&state.pool).await?
    } else {
        vec![find_user(&state, auth.user_id).await?]
    };

    let stats = build_stats(&state, &users, &params).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/stats/{operator_id}?from=&to=
pub async fn get_operator_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(operator_id): Path<DbId>,
    Query(params): Query<DateRangeParams>,
) -> AppResult<Json<DataResponse<StatsByOperator>>> {
    if !auth.can_view(operator_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only your own statistics are visible".into(),
        )));
    }
    let user = find_user(&state, operator_id).await?;

    let stats = build_stats(&state, &[user], &params).await?;
    Ok(Json(DataResponse { data: stats }))
}

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "User", id }))
}

async fn build_stats(
    state: &AppState,
    users: &[User],
    params: &DateRangeParams,
) -> AppResult<StatsByOperator> {
    let opts = state.config.stats.aggregate_options(params.to_range()?);
    let (from, to) = opts.range.utc_bounds(opts.offset);

    let ids: Vec<DbId> = users.iter().map(|u| u.id).collect();
    let saves = JobStatsSaveRepo::list_for_annotators(&state.pool, &ids, from, to).await?;
    let records: Vec<SaveRecord> = saves.iter().map(SaveRecord::from).collect();
    let operators: Vec<Operator> = users.iter().map(User::to_operator).collect();

    tracing::debug!(
        operators = operators.len(),
        saves = records.len(),
        "Aggregating operator statistics"
    );

    Ok(collect_operator_stats(&operators, &records, &opts))
}
