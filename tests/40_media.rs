mod common;

use anyhow::Result;
use mindfulspace_api::types::Role;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn only_soundcloud_urls_are_resolved() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::access_token(Role::User);

    for url in ["https://example.com/track", "ftp://soundcloud.com/x", "not a url", "https://evilsoundcloud.com/a"] {
        let res = client
            .get(server.url("/api/media/soundcloud"))
            .query(&[("url", url)])
            .bearer_auth(&token)
            .send()
            .await?;
        let body = common::expect_error(res, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await?;
        assert!(body["field_errors"]["url"].is_string(), "url {url}");
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_oembed_falls_back_to_null() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/media/soundcloud"))
        .query(&[("url", "https://soundcloud.com/artist/evening-wind-down")])
        .bearer_auth(common::access_token(Role::User))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
    Ok(())
}
