use std::time::Duration;

use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{get_config_dir, load_config};
use crate::cli::utils::{output_data, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::sync::{FlushOutcome, HttpSleepTransport, SleepQueue};

#[derive(Subcommand)]
pub enum SyncCommands {
    #[command(about = "Send queued sleep logs now")]
    Flush,

    #[command(about = "Show queued sleep logs")]
    Status,

    #[command(about = "Keep running and sync whenever the server is reachable")]
    Watch {
        #[arg(long, default_value_t = 30, help = "Seconds between connectivity probes")]
        interval: u64,
    },
}

pub async fn handle(cmd: SyncCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let queue = SleepQueue::open_in(&get_config_dir()?).await?;

    match cmd {
        SyncCommands::Status => {
            let entries = queue.entries().await;
            if entries.is_empty() {
                return output_empty_collection(&output_format, "pending", "Sleep queue is empty");
            }
            output_data(&output_format, &json!({ "pending": entries }))
        }
        SyncCommands::Flush => {
            config.require_session()?;
            let transport = HttpSleepTransport::new(&config.server_url, config.access_token())?;
            match queue.flush(&transport).await? {
                FlushOutcome::Skipped => output_success(&output_format, "A sync is already running", None),
                FlushOutcome::Flushed(report) => {
                    let mut message = format!(
                        "Sent {}, rejected {}, {} remaining",
                        report.sent, report.rejected, report.remaining
                    );
                    if let Some(reason) = &report.stopped {
                        message.push_str(&format!(" (stopped: {})", reason));
                    }
                    output_success(&output_format, &message, Some(json!({ "report": report })))
                }
            }
        }
        SyncCommands::Watch { interval } => {
            config.require_session()?;
            let transport = HttpSleepTransport::new(&config.server_url, config.access_token())?;
            eprintln!(
                "Watching {} every {}s ({} queued). Press Ctrl-C to stop.",
                config.server_url,
                interval,
                queue.len().await
            );

            tokio::select! {
                result = queue.watch(&transport, Duration::from_secs(interval.max(1))) => result?,
                _ = tokio::signal::ctrl_c() => {}
            }

            output_success(
                &output_format,
                &format!("Stopped watching, {} still queued", queue.len().await),
                None,
            )
        }
    }
}
