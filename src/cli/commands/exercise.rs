use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::config::load_config;
use crate::cli::utils::{output_data, output_new_badges, output_success};
use crate::cli::OutputFormat;
use crate::types::ExerciseKind;

#[derive(Subcommand)]
pub enum ExerciseCommands {
    #[command(about = "List the exercise catalog")]
    Contents {
        #[arg(long, help = "Filter by kind: cardio, strength, flexibility, breathing")]
        kind: Option<ExerciseKind>,
    },

    #[command(about = "Log an exercise session")]
    Log {
        #[arg(long, help = "Exercise content id")]
        content_id: Uuid,
        #[arg(long, help = "Length in minutes")]
        minutes: i32,
        #[arg(long)]
        repetitions: Option<i32>,
        #[arg(long, help = "Quality score from 1 to 5")]
        quality: Option<i16>,
        #[arg(long, help = "Day of the session (YYYY-MM-DD, defaults to today)")]
        date: Option<NaiveDate>,
    },

    #[command(about = "List logged sessions, newest first")]
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    #[command(about = "Minutes and most frequent exercise over a window")]
    Summary {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

pub async fn handle(cmd: ExerciseCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;

    if let ExerciseCommands::Contents { kind } = &cmd {
        let client = ApiClient::new(&config.server_url, None)?;
        let query: Vec<_> = kind.iter().map(|k| ("kind", k.as_str().to_string())).collect();
        let contents = client.get("/exercise/contents", &query).await?;
        return output_data(&output_format, &contents);
    }

    config.require_session()?;
    let client = ApiClient::from_config(&config)?;

    match cmd {
        ExerciseCommands::Contents { .. } => Ok(()),
        ExerciseCommands::Log { content_id, minutes, repetitions, quality, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let data = client
                .post(
                    "/api/exercise",
                    &json!({
                        "exercise_content_id": content_id,
                        "date": date,
                        "duration_minutes": minutes,
                        "repetitions": repetitions,
                        "quality": quality,
                    }),
                )
                .await?;
            output_success(
                &output_format,
                &format!("Logged {} min of exercise for {}", minutes, date),
                Some(json!({ "data": data })),
            )?;
            output_new_badges(&output_format, &data);
            Ok(())
        }
        ExerciseCommands::List { from, to } => {
            let mut query = Vec::new();
            if let Some(from) = from {
                query.push(("from", from.to_string()));
            }
            if let Some(to) = to {
                query.push(("to", to.to_string()));
            }
            let sessions = client.get("/api/exercise", &query).await?;
            output_data(&output_format, &sessions)
        }
        ExerciseCommands::Summary { days } => {
            let summary = client
                .get("/api/exercise/summary", &[("days", days.to_string())])
                .await?;
            output_data(&output_format, &summary)
        }
    }
}
