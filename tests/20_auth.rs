mod common;

use anyhow::Result;
use mindfulspace_api::types::Role;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/api/auth/whoami", "/api/sleep", "/api/badges", "/api/world/overview"] {
        let res = client.get(server.url(path)).send().await?;
        common::expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    }

    let res = client
        .get(server.url("/api/sleep"))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    common::expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    Ok(())
}

#[tokio::test]
async fn refresh_tokens_do_not_authorize_api_calls() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/sleep/summary"))
        .bearer_auth(common::refresh_token(Role::User))
        .send()
        .await?;
    common::expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    Ok(())
}

#[tokio::test]
async fn coach_routes_reject_plain_users() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::access_token(Role::User);

    let res = client
        .post(server.url("/api/coach/programs"))
        .bearer_auth(&token)
        .json(&json!({ "slug": "week-one", "title": "Week one", "kind": "workout", "days": [] }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    let res = client
        .post(server.url("/api/coach/categories"))
        .json(&json!({ "slug": "sleep" }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;
    Ok(())
}

#[tokio::test]
async fn coach_input_is_validated_before_storage() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/coach/exercise/contents"))
        .bearer_auth(common::access_token(Role::Coach))
        .json(&json!({
            "slug": "Push Ups",
            "name": "Push-ups",
            "kind": "strength",
            "default_duration_minutes": 10
        }))
        .send()
        .await?;
    let body = common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["slug"].is_string());
    Ok(())
}

#[tokio::test]
async fn root_routes_are_admin_only() -> Result<()> {
    let server = common::ensure_server().await?;
    let path = format!("/api/root/users/{}/role", Uuid::new_v4());

    let res = reqwest::Client::new()
        .put(server.url(&path))
        .bearer_auth(common::access_token(Role::Coach))
        .json(&json!({ "role": "admin" }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::FORBIDDEN, "FORBIDDEN").await?;

    let res = reqwest::Client::new()
        .put(server.url(&path))
        .bearer_auth(common::access_token(Role::Admin))
        .json(&json!({ "role": "superuser" }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "INVALID_JSON").await?;
    Ok(())
}

#[tokio::test]
async fn register_validates_before_touching_the_database() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/auth/register"))
        .json(&json!({ "email": "not-an-email", "password": "short", "locale": "de" }))
        .send()
        .await?;
    let body = common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["password"].is_string());
    assert!(body["field_errors"]["locale"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_invalid_json() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "INVALID_JSON").await?;
    Ok(())
}
