use clap::Subcommand;
use serde_json::json;
use url::Url;

use crate::cli::client::{ApiClient, ClientError};
use crate::cli::config::{load_config, save_config};
use crate::cli::utils::{output_data, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at an API server (clears the stored session)")]
    Set {
        #[arg(help = "Server base URL, e.g. http://localhost:3001")]
        url: String,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let parsed = Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("Server URL must use http or https");
            }

            let mut config = load_config()?;
            let server_url = parsed.as_str().trim_end_matches('/').to_string();
            if config.server_url != server_url {
                config.session = None;
            }
            config.server_url = server_url.clone();
            save_config(&config)?;

            output_success(
                &output_format,
                &format!("Using server {}", server_url),
                Some(json!({ "server_url": server_url })),
            )
        }
        ServerCommands::Show => {
            let config = load_config()?;
            output_data(
                &output_format,
                &json!({
                    "server_url": config.server_url,
                    "logged_in_as": config.session.as_ref().map(|s| s.email.clone()),
                }),
            )
        }
        ServerCommands::Health => {
            let config = load_config()?;
            let client = ApiClient::from_config(&config)?;
            match client.health().await {
                Ok((status, body)) => {
                    let data = body.get("data").cloned().unwrap_or(body);
                    output_data(&output_format, &json!({ "http_status": status.as_u16(), "health": data }))?;
                    if !status.is_success() {
                        anyhow::bail!("Server {} is degraded", client.base_url());
                    }
                    Ok(())
                }
                Err(e @ ClientError::Unreachable { .. }) => {
                    output_data(&output_format, &json!({ "status": "down", "error": e.to_string() }))?;
                    anyhow::bail!("Server {} is unreachable", client.base_url())
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
