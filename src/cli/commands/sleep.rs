use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde_json::json;

use crate::cli::client::{ApiClient, ClientError};
use crate::cli::config::{get_config_dir, load_config};
use crate::cli::utils::{output_data, output_empty_collection, output_new_badges, output_success};
use crate::cli::OutputFormat;
use crate::services::sleep_service::SleepInput;
use crate::sync::{EnqueueOutcome, FlushOutcome, HttpSleepTransport, SleepQueue};
use crate::validation::Validate;

#[derive(Subcommand)]
pub enum SleepCommands {
    #[command(about = "Log a night of sleep (queued offline if the server is unreachable)")]
    Log {
        #[arg(long, help = "Night the sleep belongs to (YYYY-MM-DD, defaults to today)")]
        date: Option<NaiveDate>,
        #[arg(long, help = "Hours slept, greater than 0 and at most 24")]
        hours: f64,
        #[arg(long, help = "Quality score from 1 to 5")]
        quality: Option<i16>,
    },

    #[command(about = "List logged nights, newest first")]
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<i64>,
    },

    #[command(about = "Average hours and quality over a window")]
    Summary {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

pub async fn handle(cmd: SleepCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    config.require_session()?;
    let client = ApiClient::from_config(&config)?;

    match cmd {
        SleepCommands::Log { date, hours, quality } => {
            let payload = SleepInput {
                date: date.unwrap_or_else(|| Local::now().date_naive()),
                hours,
                quality,
            };
            if let Err(errors) = payload.validate() {
                anyhow::bail!("Invalid sleep log: {}", errors);
            }

            match client.post("/api/sleep", &payload).await {
                Ok(data) => {
                    output_success(
                        &output_format,
                        &format!("Logged {} h of sleep for {}", payload.hours, payload.date),
                        Some(json!({ "data": data })),
                    )?;
                    output_new_badges(&output_format, &data);
                    flush_backlog(&config.server_url, config.access_token()).await;
                    Ok(())
                }
                Err(e) if should_queue(&e) => {
                    let queue = SleepQueue::open_in(&get_config_dir()?).await?;
                    let outcome = queue.enqueue(payload.clone()).await?;
                    let message = match outcome {
                        EnqueueOutcome::Duplicate => format!("Server unreachable; {} is already queued", payload.date),
                        EnqueueOutcome::Replaced => format!("Server unreachable; replaced queued entry for {}", payload.date),
                        EnqueueOutcome::Added => format!("Server unreachable; queued sleep log for {}", payload.date),
                    };
                    tracing::debug!("Queued sleep log after error: {}", e);
                    output_success(
                        &output_format,
                        &message,
                        Some(json!({ "queued": true, "pending": queue.len().await })),
                    )
                }
                Err(e) => Err(e.into()),
            }
        }
        SleepCommands::List { from, to, limit } => {
            let mut query = Vec::new();
            if let Some(from) = from {
                query.push(("from", from.to_string()));
            }
            if let Some(to) = to {
                query.push(("to", to.to_string()));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }

            let nights = client.get("/api/sleep", &query).await?;
            if nights.as_array().is_some_and(|n| n.is_empty()) {
                return output_empty_collection(&output_format, "sleep", "No sleep logged yet");
            }
            output_data(&output_format, &nights)
        }
        SleepCommands::Summary { days } => {
            let summary = client.get("/api/sleep/summary", &[("days", days.to_string())]).await?;
            output_data(&output_format, &summary)
        }
    }
}

/// Network failures and server-side errors are retried later; 4xx answers are final.
fn should_queue(error: &ClientError) -> bool {
    match error {
        ClientError::Unreachable { .. } => true,
        ClientError::Api { status, .. } => status.is_server_error(),
        _ => false,
    }
}

/// Best-effort replay of earlier offline entries once a post went through.
async fn flush_backlog(server_url: &str, access_token: Option<String>) {
    let Ok(dir) = get_config_dir() else {
        return;
    };
    let Ok(queue) = SleepQueue::open_in(&dir).await else {
        return;
    };
    if queue.is_empty().await {
        return;
    }
    let Ok(transport) = HttpSleepTransport::new(server_url, access_token) else {
        return;
    };
    match queue.flush(&transport).await {
        Ok(FlushOutcome::Flushed(report)) if report.sent > 0 => {
            eprintln!("Synced {} queued night(s), {} still pending", report.sent, report.remaining);
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Sleep queue flush failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn only_transient_failures_are_queued() {
        let server_error = ClientError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "SERVICE_UNAVAILABLE".into(),
            message: "database unavailable".into(),
            field_errors: None,
        };
        assert!(should_queue(&server_error));

        let validation = ClientError::Api {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR".into(),
            message: "Validation failed".into(),
            field_errors: None,
        };
        assert!(!should_queue(&validation));
        assert!(!should_queue(&ClientError::InvalidUrl("x".into())));

        let proxy_error = ClientError::Api {
            status: StatusCode::BAD_GATEWAY,
            code: "UNKNOWN".into(),
            message: "Bad Gateway".into(),
            field_errors: None,
        };
        assert!(should_queue(&proxy_error));
    }
}
