use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config;

/// Embeddable player metadata for an external track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub title: String,
    pub author_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub embed_html: String,
    pub embed_url: Option<String>,
}

/// Resolves a public track URL. `None` means "no embed available"; callers
/// degrade to showing the plain link.
#[async_trait::async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Option<ResolvedMedia>;
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
    html: String,
}

/// Accept only http(s) URLs on soundcloud.com or one of its subdomains.
pub fn validate_soundcloud_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|_| "must be a valid URL".to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err("must use http or https".to_string());
    }
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if host != "soundcloud.com" && !host.ends_with(".soundcloud.com") {
        return Err("must be a soundcloud.com URL".to_string());
    }
    Ok(url)
}

/// Pull the player URL out of the `src` attribute of an oEmbed iframe.
pub fn extract_embed_url(html: &str) -> Option<String> {
    let start = html.find("src=\"")? + 5;
    let len = html[start..].find('"')?;
    let src = &html[start..start + len];
    if src.is_empty() {
        None
    } else {
        Some(src.replace("&amp;", "&"))
    }
}

pub struct SoundCloudResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl SoundCloudResolver {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config() -> Self {
        let media = &config::config().media;
        Self::new(media.soundcloud_oembed_url.clone(), Duration::from_secs(media.timeout_secs))
    }
}

#[async_trait::async_trait]
impl MediaResolver for SoundCloudResolver {
    async fn resolve(&self, url: &str) -> Option<ResolvedMedia> {
        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("url", url)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("SoundCloud oEmbed request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("SoundCloud oEmbed returned {} for {}", response.status(), url);
            return None;
        }

        let body: OEmbedResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("SoundCloud oEmbed body could not be parsed: {}", e);
                return None;
            }
        };

        debug!("Resolved SoundCloud embed for {}", url);
        Some(ResolvedMedia {
            title: body.title.unwrap_or_default(),
            author_name: body.author_name,
            thumbnail_url: body.thumbnail_url,
            embed_url: extract_embed_url(&body.html),
            embed_html: body.html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_soundcloud_hosts_are_accepted() {
        assert!(validate_soundcloud_url("https://soundcloud.com/artist/track").is_ok());
        assert!(validate_soundcloud_url("https://m.soundcloud.com/artist/track").is_ok());
        assert!(validate_soundcloud_url("https://notsoundcloud.com/a").is_err());
        assert!(validate_soundcloud_url("https://soundcloud.com.evil.io/a").is_err());
        assert!(validate_soundcloud_url("ftp://soundcloud.com/a").is_err());
        assert!(validate_soundcloud_url("not a url").is_err());
    }

    #[test]
    fn embed_url_comes_from_iframe_src() {
        let html = r#"<iframe width="100%" height="400" src="https://w.soundcloud.com/player/?visual=true&amp;url=x"></iframe>"#;
        assert_eq!(
            extract_embed_url(html),
            Some("https://w.soundcloud.com/player/?visual=true&url=x".to_string())
        );
        assert_eq!(extract_embed_url("<p>no frame</p>"), None);
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back_to_none() {
        let resolver = SoundCloudResolver::new("http://127.0.0.1:1/oembed", Duration::from_secs(2));
        assert!(resolver.resolve("https://soundcloud.com/a/b").await.is_none());
    }
}
