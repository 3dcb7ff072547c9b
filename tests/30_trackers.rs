mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use mindfulspace_api::types::Role;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn sleep_input_is_range_checked() -> Result<()> {
    let server = common::ensure_server().await?;
    let tomorrow = Utc::now().date_naive() + Duration::days(2);

    let res = reqwest::Client::new()
        .post(server.url("/api/sleep"))
        .bearer_auth(common::access_token(Role::User))
        .json(&json!({ "date": tomorrow, "hours": 30, "quality": 9 }))
        .send()
        .await?;
    let body = common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["hours"].is_string());
    assert!(body["field_errors"]["quality"].is_string());
    assert!(body["field_errors"]["date"].is_string());
    Ok(())
}

#[tokio::test]
async fn valid_sleep_log_hits_the_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let last_night = Utc::now().date_naive() - Duration::days(1);

    let res = reqwest::Client::new()
        .post(server.url("/api/sleep"))
        .bearer_auth(common::access_token(Role::User))
        .json(&json!({ "date": last_night, "hours": 7.5 }))
        .send()
        .await?;
    // the offline queue treats this as transient and retries later
    common::expect_error(res, StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE").await?;
    Ok(())
}

#[tokio::test]
async fn summary_window_is_bounded() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::access_token(Role::User);

    for path in [
        "/api/sleep/summary?days=0",
        "/api/meditation/summary?days=400",
        "/api/exercise/summary?days=-1",
        "/api/world/overview?days=366",
    ] {
        let res = client.get(server.url(path)).bearer_auth(&token).send().await?;
        common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    }
    Ok(())
}

#[tokio::test]
async fn list_range_must_be_ordered() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/sleep?from=2024-03-10&to=2024-03-01"))
        .bearer_auth(common::access_token(Role::User))
        .send()
        .await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    Ok(())
}

#[tokio::test]
async fn meditation_mood_is_scored_one_to_five() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/meditation"))
        .bearer_auth(common::access_token(Role::User))
        .json(&json!({
            "type_id": uuid::Uuid::new_v4(),
            "duration_minutes": 0,
            "mood_before": 0,
            "mood_after": 6
        }))
        .send()
        .await?;
    let body = common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
    assert!(body["field_errors"]["duration_minutes"].is_string());
    assert!(body["field_errors"]["mood_before"].is_string());
    assert!(body["field_errors"]["mood_after"].is_string());
    Ok(())
}

#[tokio::test]
async fn program_day_must_be_positive() -> Result<()> {
    let server = common::ensure_server().await?;
    let path = format!("/api/user-programs/{}/days/abc/complete", uuid::Uuid::new_v4());

    let res = reqwest::Client::new()
        .post(server.url(&path))
        .bearer_auth(common::access_token(Role::User))
        .send()
        .await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;
    Ok(())
}
