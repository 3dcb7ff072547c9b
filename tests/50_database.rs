// Rules that only hold with a real Postgres behind the API.
// Run with TEST_DATABASE_URL=postgres://... ; each test returns early without it.

mod common;

use anyhow::Result;
use mindfulspace_api::types::Role;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

async fn send(request: reqwest::RequestBuilder, expected: StatusCode) -> Result<Value> {
    let res = request.send().await?;
    let status = res.status();
    let body = if status == StatusCode::NO_CONTENT { Value::Null } else { res.json::<Value>().await? };
    assert_eq!(status, expected, "body: {body}");
    Ok(body["data"].clone())
}

fn slugs(badges: &Value) -> Vec<String> {
    badges
        .as_array()
        .map(|list| list.iter().filter_map(|b| b["slug"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let session = common::register(server, "twice").await?;
    let email = session["user"]["email"].as_str().unwrap_or_default().to_uppercase();

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({ "email": email, "password": "another password" }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::CONFLICT, "CONFLICT").await?;
    Ok(())
}

#[tokio::test]
async fn sleep_resubmission_replaces_the_night_and_awards_once() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let session = common::register(server, "sleeper").await?;
    let token = session["access_token"].as_str().unwrap_or_default().to_string();

    let first = send(
        client.post(server.url("/api/sleep")).bearer_auth(&token).json(&json!({ "date": "2024-03-01", "hours": 6.0, "quality": 2 })),
        StatusCode::CREATED,
    )
    .await?;
    assert!(slugs(&first["new_badges"]).contains(&"first-night".to_string()));

    let second = send(
        client.post(server.url("/api/sleep")).bearer_auth(&token).json(&json!({ "date": "2024-03-01", "hours": 8.5, "quality": 5 })),
        StatusCode::CREATED,
    )
    .await?;
    assert_eq!(second["session"]["id"], first["session"]["id"]);
    assert_eq!(second["session"]["hours"], 8.5);
    assert_eq!(second["session"]["quality"], 5);
    assert!(slugs(&second["new_badges"]).is_empty(), "badge awarded twice: {second}");

    let nights = send(client.get(server.url("/api/sleep")).bearer_auth(&token), StatusCode::OK).await?;
    assert_eq!(nights.as_array().map(Vec::len), Some(1));

    let earned = send(client.get(server.url("/api/badges/me")).bearer_auth(&token), StatusCode::OK).await?;
    assert_eq!(slugs(&earned).iter().filter(|s| *s == "first-night").count(), 1);
    Ok(())
}

#[tokio::test]
async fn program_subscription_and_completion() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();

    // Promote a real account; the new role arrives with the next refresh
    let coach = common::register(server, "coach").await?;
    let coach_id = coach["user"]["id"].as_str().unwrap_or_default().to_string();
    send(
        client
            .put(server.url(&format!("/api/root/users/{}/role", coach_id)))
            .bearer_auth(common::access_token(Role::Admin))
            .json(&json!({ "role": "coach" })),
        StatusCode::OK,
    )
    .await?;
    let refreshed = send(
        client.post(server.url("/auth/refresh")).json(&json!({ "refresh_token": coach["refresh_token"] })),
        StatusCode::OK,
    )
    .await?;
    let coach_token = refreshed["access_token"].as_str().unwrap_or_default().to_string();
    assert_eq!(refreshed["user"]["role"], "coach");

    let slug = format!("two-days-{}", Uuid::new_v4().simple());
    let program = send(
        client.post(server.url("/api/coach/programs")).bearer_auth(&coach_token).json(&json!({
            "slug": slug,
            "title": "Two easy days",
            "kind": "workout",
            "days": [
                { "day_number": 2, "title": "Stretch" },
                { "day_number": 1, "title": "Walk", "duration_minutes": 20 }
            ]
        })),
        StatusCode::CREATED,
    )
    .await?;
    let program_id = program["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(program["days"].as_array().map(Vec::len), Some(2));

    let user = common::register(server, "trainee").await?;
    let token = user["access_token"].as_str().unwrap_or_default().to_string();
    let subscribe_url = server.url(&format!("/api/programs/{}/subscribe", program_id));

    let subscription = send(client.post(&subscribe_url).bearer_auth(&token), StatusCode::CREATED).await?;
    let subscription_id = subscription["id"].as_str().unwrap_or_default().to_string();

    let res = client.post(&subscribe_url).bearer_auth(&token).send().await?;
    common::expect_error(res, StatusCode::CONFLICT, "CONFLICT").await?;

    let day_url = |day: i32| server.url(&format!("/api/user-programs/{}/days/{}/complete", subscription_id, day));

    for _ in 0..2 {
        let done = send(client.post(day_url(1)).bearer_auth(&token), StatusCode::OK).await?;
        assert_eq!(done["progress"]["completed_days"], 1);
        assert_eq!(done["progress"]["total_days"], 2);
        assert!(done["subscription"]["completed_at"].is_null());
    }

    let res = client.post(day_url(3)).bearer_auth(&token).send().await?;
    common::expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await?;

    let finished = send(client.post(day_url(2)).bearer_auth(&token), StatusCode::OK).await?;
    assert_eq!(finished["progress"]["percent"], 100);
    assert!(finished["subscription"]["completed_at"].is_string());
    assert!(slugs(&finished["new_badges"]).contains(&"program-finisher".to_string()));

    let again = send(client.post(day_url(2)).bearer_auth(&token), StatusCode::OK).await?;
    assert_eq!(again["subscription"]["completed_at"], finished["subscription"]["completed_at"]);
    assert!(slugs(&again["new_badges"]).is_empty());

    // A finished program no longer blocks a fresh run
    send(client.post(&subscribe_url).bearer_auth(&token), StatusCode::CREATED).await?;
    Ok(())
}

#[tokio::test]
async fn account_deletion_cascades() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let session = common::register(server, "leaving").await?;
    let token = session["access_token"].as_str().unwrap_or_default().to_string();
    let user_id: Uuid = session["user"]["id"].as_str().unwrap_or_default().parse()?;
    let email = session["user"]["email"].clone();

    send(
        client.post(server.url("/api/sleep")).bearer_auth(&token).json(&json!({ "date": "2024-03-02", "hours": 7.0 })),
        StatusCode::CREATED,
    )
    .await?;

    send(client.delete(server.url("/api/users/me")).bearer_auth(&token), StatusCode::NO_CONTENT).await?;

    let res = client.get(server.url("/api/auth/whoami")).bearer_auth(&token).send().await?;
    common::expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await?;

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": email, "password": "correct horse battery" }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await?;

    let pool = common::db_pool().await?;
    let (sleeps, badges): (i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM sleep_sessions WHERE user_id = $1),
                (SELECT COUNT(*) FROM user_badges WHERE user_id = $1)",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!((sleeps, badges), (0, 0));
    Ok(())
}
