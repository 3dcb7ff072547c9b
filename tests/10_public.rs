mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "MindfulSpace API");
    assert!(body["data"]["endpoints"]["coach"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_degraded_without_database() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    // connection details stay server-side
    assert!(!body.to_string().contains("127.0.0.1:1"));
    Ok(())
}

#[tokio::test]
async fn catalog_reads_surface_database_outage_as_503() -> Result<()> {
    let server = common::ensure_server().await?;

    for path in ["/programs", "/meditation/types?lang=fr", "/categories"] {
        let res = reqwest::get(server.url(path)).await?;
        common::expect_error(res, StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE").await?;
    }
    Ok(())
}

#[tokio::test]
async fn catalog_query_validation_runs_first() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/meditation/contents?duration_min=20&duration_max=5")).await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;

    let res = reqwest::get(server.url("/exercise/contents?kind=juggling")).await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;

    let res = reqwest::get(server.url("/programs/not-a-uuid")).await?;
    common::expect_error(res, StatusCode::BAD_REQUEST, "BAD_REQUEST").await?;
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/data/users")).await?;
    common::expect_error(res, StatusCode::NOT_FOUND, "NOT_FOUND").await?;
    Ok(())
}
