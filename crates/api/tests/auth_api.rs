//! HTTP-level integration tests for login and bearer-token enforcement.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, create_user_with_hash, get, get_auth, post_json, post_json_auth,
    token_for,
};
use opstats_api::auth::password::hash_password;
use opstats_db::repositories::UserRepo;
use sqlx::PgPool;

const PASSWORD: &str = "test_password_123!";

async fn create_login_user(pool: &PgPool, username: &str, is_superuser: bool) -> i64 {
    let hashed = hash_password(PASSWORD).expect("hashing should succeed");
    create_user_with_hash(pool, username, is_superuser, &hashed)
        .await
        .id
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_token_and_annotator_role(pool: PgPool) {
    let user_id = create_login_user(&pool, "anna", false).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "anna", "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], user_id);
    assert_eq!(json["user"]["username"], "anna");
    assert_eq!(json["user"]["role"], "annotator");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn superuser_logs_in_as_admin(pool: PgPool) {
    create_login_user(&pool, "root", true).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "root", "password": PASSWORD });
    let json = body_json(post_json(app, "/api/v1/auth/login", body).await).await;

    assert_eq!(json["user"]["role"], "admin");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn issued_token_opens_stats_endpoint(pool: PgPool) {
    create_login_user(&pool, "anna", false).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "anna", "password": PASSWORD });
    let json = body_json(post_json(app.clone(), "/api/v1/auth/login", body).await).await;
    let token = json["access_token"].as_str().unwrap();

    let response = get_auth(app, "/api/v1/stats", token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_is_unauthorized(pool: PgPool) {
    create_login_user(&pool, "anna", false).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "anna", "password": "incorrect" });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_user_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "ghost", "password": "whatever" });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_user_is_forbidden(pool: PgPool) {
    let user_id = create_login_user(&pool, "gone", false).await;
    UserRepo::deactivate(&pool, user_id)
        .await
        .expect("deactivation should succeed");
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "username": "gone", "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Bearer token enforcement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_without_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/stats").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing Authorization header");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/stats", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivated_user_token_is_forbidden(pool: PgPool) {
    let anna = create_user(&pool, "anna", false).await;
    let token = token_for(&anna);
    UserRepo::deactivate(&pool, anna.id)
        .await
        .expect("deactivation should succeed");
    let app = common::build_test_app(pool);

    let read = get_auth(app.clone(), "/api/v1/stats", &token).await;
    assert_eq!(read.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(read).await["error"], "Account is deactivated");

    let write = post_json_auth(
        app,
        "/api/v1/stats/saves",
        serde_json::json!({ "job": 1 }),
        &token,
    )
    .await;
    assert_eq!(write.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_user_token_is_unauthorized(pool: PgPool) {
    let anna = create_user(&pool, "anna", false).await;
    let token = token_for(&anna);
    UserRepo::delete(&pool, anna.id)
        .await
        .expect("deletion should succeed");
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/stats", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
