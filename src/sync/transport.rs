use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::services::sleep_service::SleepInput;

use super::SyncError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivery side of the offline queue.
#[async_trait]
pub trait SleepTransport: Send + Sync {
    /// Post one night to the API.
    async fn submit(&self, payload: &SleepInput) -> Result<(), SyncError>;

    /// Whether the API is reachable right now.
    async fn is_online(&self) -> bool;
}

/// Parse a server URL as a directory so a path prefix (`https://host/mindful`) survives joins.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolve an API path (`/api/sleep` or `api/sleep`) under `base`.
pub fn api_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    base.join(path.trim_start_matches('/'))
}

pub struct HttpSleepTransport {
    base_url: Url,
    http: reqwest::Client,
    access_token: Option<String>,
}

impl HttpSleepTransport {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, SyncError> {
        let base_url = parse_base_url(base_url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            access_token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        api_url(&self.base_url, path).map_err(|e| SyncError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl SleepTransport for HttpSleepTransport {
    async fn submit(&self, payload: &SleepInput) -> Result<(), SyncError> {
        let url = self.endpoint("/api/sleep")?;
        debug!(url = %url, date = %payload.date, "submitting sleep log");

        let mut request = self.http.post(url).json(payload).timeout(SUBMIT_TIMEOUT);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Prefer the API's own error message over the raw body
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        Err(SyncError::from_status(status.as_u16(), message))
    }

    async fn is_online(&self) -> bool {
        let Ok(url) = self.endpoint("/health") else {
            return false;
        };
        match self.http.get(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            HttpSleepTransport::new("not a url", None),
            Err(SyncError::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoints_keep_the_server_path_prefix() {
        let transport = HttpSleepTransport::new("https://example.com/mindful", None).unwrap();
        assert_eq!(transport.endpoint("/api/sleep").unwrap().as_str(), "https://example.com/mindful/api/sleep");
        assert_eq!(transport.endpoint("/health").unwrap().as_str(), "https://example.com/mindful/health");

        let root = parse_base_url("http://localhost:3001").unwrap();
        assert_eq!(api_url(&root, "/api/sleep").unwrap().as_str(), "http://localhost:3001/api/sleep");
    }

    #[tokio::test]
    async fn unreachable_server_is_transient() {
        let transport = HttpSleepTransport::new("http://127.0.0.1:1", Some("token".into())).unwrap();
        assert!(!transport.is_online().await);

        let payload = SleepInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            hours: 7.5,
            quality: None,
        };
        let err = transport.submit(&payload).await.unwrap_err();
        assert!(err.is_transient());
    }
}
