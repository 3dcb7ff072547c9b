use crate::cli::client::ApiClient;
use crate::cli::config::load_config;
use crate::cli::utils::output_data;
use crate::cli::OutputFormat;

/// `mindful hub` - the World Hub overview
pub async fn handle(days: i64, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    config.require_session()?;

    let client = ApiClient::from_config(&config)?;
    let overview = client.get("/api/world/overview", &[("days", days.to_string())]).await?;
    output_data(&output_format, &overview)
}
