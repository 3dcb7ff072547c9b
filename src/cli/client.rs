use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::cli::config::CliConfig;
use crate::sync::transport::{api_url, parse_base_url};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
        field_errors: Option<Value>,
    },

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Thin JSON client for the MindfulSpace API; unwraps the `{success, data}` envelope.
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, ClientError> {
        let base_url = parse_base_url(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            access_token,
        })
    }

    pub fn from_config(config: &CliConfig) -> Result<Self, ClientError> {
        Self::new(&config.server_url, config.access_token())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let request = self.request(Method::GET, path)?.query(query);
        self.send(request).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(request).await
    }

    /// `GET /health` status without unwrapping the envelope.
    pub async fn health(&self) -> Result<(StatusCode, Value), ClientError> {
        let url = self.url("/health")?;
        let response = self
            .http
            .get(url.clone())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|source| ClientError::Unreachable { url: url.to_string(), source })?;
        let status = response.status();
        let body = response.json::<Value>().await.map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok((status, body))
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        api_url(&self.base_url, path).map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let mut request = self.http.request(method, self.url(path)?).timeout(REQUEST_TIMEOUT);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await.map_err(|source| ClientError::Unreachable {
            url: self.base_url.to_string(),
            source,
        })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response.text().await.map_err(|e| ClientError::Decode(e.to_string()))?;
        decode_response(status, &text)
    }
}

/// Classify by status first: a failing status with a non-JSON body (proxy error pages) is
/// still an `Api` error carrying that status.
fn decode_response(status: StatusCode, text: &str) -> Result<Value, ClientError> {
    match serde_json::from_str::<Value>(text) {
        Ok(body) => unwrap_envelope(status, body),
        Err(e) if status.is_success() => Err(ClientError::Decode(e.to_string())),
        Err(_) => Err(ClientError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: status.canonical_reason().unwrap_or("request failed").to_string(),
            field_errors: None,
        }),
    }
}

fn unwrap_envelope(status: StatusCode, mut body: Value) -> Result<Value, ClientError> {
    if status.is_success() && body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get_mut("data").map(Value::take).unwrap_or(Value::Null));
    }

    Err(ClientError::Api {
        status,
        code: body.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN").to_string(),
        message: body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string(),
        field_errors: body.get_mut("field_errors").map(Value::take),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_data() {
        let data = unwrap_envelope(StatusCode::OK, json!({"success": true, "data": {"status": "ok"}})).unwrap();
        assert_eq!(data, json!({"status": "ok"}));
    }

    #[test]
    fn html_gateway_error_keeps_its_status() {
        let err = decode_response(StatusCode::BAD_GATEWAY, "<html><body>502 Bad Gateway</body></html>").unwrap_err();
        match err {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(code, "UNKNOWN");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(decode_response(StatusCode::OK, "not json"), Err(ClientError::Decode(_))));
    }

    #[test]
    fn error_envelope_keeps_code_and_fields() {
        let err = unwrap_envelope(
            StatusCode::BAD_REQUEST,
            json!({
                "success": false,
                "error": "Validation failed",
                "code": "VALIDATION_ERROR",
                "field_errors": {"hours": "must be greater than 0 and at most 24"}
            }),
        )
        .unwrap_err();

        match err {
            ClientError::Api { status, code, field_errors, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(code, "VALIDATION_ERROR");
                assert!(field_errors.unwrap().get("hours").is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
