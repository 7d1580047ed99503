//! Integration tests for `job_stats_saves` persistence.
//!
//! Covers insert/lookup, the idempotency constraint, and the delete rules
//! on jobs (SET NULL) and annotators (RESTRICT).

use chrono::{TimeZone, Utc};
use opstats_core::types::{DbId, Timestamp};
use opstats_db::models::job::CreateJob;
use opstats_db::models::job_stats_save::CreateJobStatsSave;
use opstats_db::models::user::CreateUser;
use opstats_db::repositories::{JobRepo, JobStatsSaveRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str) -> DbId {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: "not-a-real-hash".to_string(),
        is_superuser: false,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn new_job(pool: &PgPool, name: &str) -> DbId {
    let input = CreateJob {
        name: name.to_string(),
        assignee_id: None,
    };
    JobRepo::create(pool, &input).await.unwrap().id
}

fn at(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 4, 2, h, m, 0).unwrap()
}

fn save(job_id: DbId, annotator_id: DbId, start: Option<Timestamp>, total: i32) -> CreateJobStatsSave {
    CreateJobStatsSave {
        job_id,
        annotator_id,
        started_at: start,
        ended_at: start.map(|s| s + chrono::TimeDelta::minutes(5)),
        system_tracked_time: Some(300),
        annotated_manually: 3,
        total_annotated_manually: total,
        total_interpolated: 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn insert_and_fetch_latest(pool: PgPool) {
    let annotator = new_user(&pool, "ann").await;
    let job = new_job(&pool, "job-1").await;

    JobStatsSaveRepo::insert(&pool, &save(job, annotator, Some(at(9, 0)), 10))
        .await
        .unwrap();
    let second = JobStatsSaveRepo::insert(&pool, &save(job, annotator, Some(at(9, 5)), 25))
        .await
        .unwrap();

    let latest = JobStatsSaveRepo::latest_for(&pool, job, annotator)
        .await
        .unwrap()
        .expect("a save should exist");
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.total_annotated_manually, 25);
    assert_eq!(latest.ended_at, Some(at(9, 10)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn latest_is_scoped_to_job_and_annotator(pool: PgPool) {
    let a = new_user(&pool, "a").await;
    let b = new_user(&pool, "b").await;
    let job = new_job(&pool, "shared").await;

    JobStatsSaveRepo::insert(&pool, &save(job, a, None, 10))
        .await
        .unwrap();

    assert!(JobStatsSaveRepo::latest_for(&pool, job, b)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_interval_is_an_integrity_violation(pool: PgPool) {
    let annotator = new_user(&pool, "dup").await;
    let job = new_job(&pool, "job").await;
    let input = save(job, annotator, Some(at(10, 0)), 5);

    JobStatsSaveRepo::insert(&pool, &input).await.unwrap();
    let err = JobStatsSaveRepo::insert(&pool, &input)
        .await
        .expect_err("second insert of the same interval must fail");

    assert!(opstats_db::is_integrity_violation(&err));
    assert_eq!(
        JobStatsSaveRepo::count_for_annotator(&pool, annotator)
            .await
            .unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn saves_without_interval_may_repeat(pool: PgPool) {
    let annotator = new_user(&pool, "derived").await;
    let job = new_job(&pool, "job").await;

    JobStatsSaveRepo::insert(&pool, &save(job, annotator, None, 5))
        .await
        .unwrap();
    JobStatsSaveRepo::insert(&pool, &save(job, annotator, None, 9))
        .await
        .unwrap();

    assert_eq!(
        JobStatsSaveRepo::count_for_annotator(&pool, annotator)
            .await
            .unwrap(),
        2
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_job_is_an_integrity_violation(pool: PgPool) {
    let annotator = new_user(&pool, "ghost-job").await;

    let err = JobStatsSaveRepo::insert(&pool, &save(999_999, annotator, None, 1))
        .await
        .expect_err("foreign key must reject unknown job");

    assert!(opstats_db::is_integrity_violation(&err));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_job_keeps_saves_with_null_job(pool: PgPool) {
    let annotator = new_user(&pool, "keeper").await;
    let job = new_job(&pool, "doomed").await;
    JobStatsSaveRepo::insert(&pool, &save(job, annotator, Some(at(11, 0)), 4))
        .await
        .unwrap();

    assert!(JobRepo::delete(&pool, job).await.unwrap());

    let saves = JobStatsSaveRepo::list_for_annotators(&pool, &[annotator], None, None)
        .await
        .unwrap();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].job_id, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn annotator_with_saves_cannot_be_deleted(pool: PgPool) {
    let annotator = new_user(&pool, "protected").await;
    let job = new_job(&pool, "job").await;
    JobStatsSaveRepo::insert(&pool, &save(job, annotator, None, 4))
        .await
        .unwrap();

    let err = UserRepo::delete(&pool, annotator)
        .await
        .expect_err("annotator delete must be refused");

    assert!(opstats_db::is_integrity_violation(&err));
    assert!(UserRepo::find_by_id(&pool, annotator).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_for_annotators_applies_bounds(pool: PgPool) {
    let annotator = new_user(&pool, "ranged").await;
    let other = new_user(&pool, "other").await;
    let job = new_job(&pool, "job").await;
    for (user, h) in [(annotator, 8), (annotator, 12), (annotator, 16), (other, 12)] {
        JobStatsSaveRepo::insert(&pool, &save(job, user, Some(at(h, 0)), 1))
            .await
            .unwrap();
    }

    let saves =
        JobStatsSaveRepo::list_for_annotators(&pool, &[annotator], Some(at(10, 0)), Some(at(16, 0)))
            .await
            .unwrap();

    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].started_at, Some(at(12, 0)));
    assert_eq!(saves[0].annotator_id, annotator);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_uses_display_name(pool: PgPool) {
    let input = CreateUser {
        username: "jdoe".to_string(),
        email: "jdoe@test.com".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        password_hash: "x".to_string(),
        is_superuser: false,
    };
    let named = UserRepo::create(&pool, &input).await.unwrap().id;
    let plain = new_user(&pool, "plain").await;
    let job = new_job(&pool, "job").await;
    JobStatsSaveRepo::insert(&pool, &save(job, named, Some(at(9, 0)), 1))
        .await
        .unwrap();
    JobStatsSaveRepo::insert(&pool, &save(job, plain, Some(at(9, 0)), 1))
        .await
        .unwrap();

    let rows = JobStatsSaveRepo::list_with_annotator(&pool, 10, 0)
        .await
        .unwrap();

    let names: Vec<_> = rows.iter().map(|r| r.annotator_name.as_str()).collect();
    assert_eq!(rows.len(), 2);
    assert!(names.contains(&"Jane Doe"));
    assert!(names.contains(&"plain"));
}
