use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub server_url: String,
    #[serde(default)]
    pub session: Option<StoredSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session: None,
        }
    }
}

impl CliConfig {
    pub fn access_token(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.access_token.clone())
    }

    pub fn require_session(&self) -> anyhow::Result<&StoredSession> {
        self.session
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run 'mindful auth login <email>' first"))
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("MINDFUL_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("mindfulspace").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_config() -> anyhow::Result<CliConfig> {
    let config_file = get_config_dir()?.join("cli.json");

    if !config_file.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(config_file)?;
    let config: CliConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let config_file = get_config_dir()?.join("cli.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(config_file, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_is_explained() {
        let config = CliConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.access_token().is_none());
        assert!(config.require_session().unwrap_err().to_string().contains("mindful auth login"));
    }

    #[test]
    fn old_files_without_session_still_load() {
        let config: CliConfig = serde_json::from_str(r#"{"server_url":"http://api.test"}"#).unwrap();
        assert_eq!(config.server_url, "http://api.test");
        assert!(config.session.is_none());
    }
}
