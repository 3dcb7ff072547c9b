use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::config::load_config;
use crate::cli::utils::{output_data, output_new_badges, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum MeditationCommands {
    #[command(about = "List meditation types in a language")]
    Types {
        #[arg(long, help = "Locale, e.g. en or fr")]
        lang: Option<String>,
    },

    #[command(about = "Log a meditation or guided breathing session")]
    Log {
        #[arg(long, help = "Meditation type id")]
        type_id: Uuid,
        #[arg(long, help = "Content followed during the session")]
        content_id: Option<Uuid>,
        #[arg(long, help = "Length of the session in minutes")]
        minutes: i32,
        #[arg(long, help = "Mood before, 1 to 5")]
        mood_before: Option<i16>,
        #[arg(long, help = "Mood after, 1 to 5")]
        mood_after: Option<i16>,
    },

    #[command(about = "List logged sessions, newest first")]
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    #[command(about = "Minutes, streak and mood over a window")]
    Summary {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

pub async fn handle(cmd: MeditationCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;

    if let MeditationCommands::Types { lang } = &cmd {
        let client = ApiClient::new(&config.server_url, None)?;
        let query: Vec<_> = lang.iter().map(|l| ("lang", l.clone())).collect();
        let types = client.get("/meditation/types", &query).await?;
        return output_data(&output_format, &types);
    }

    config.require_session()?;
    let client = ApiClient::from_config(&config)?;

    match cmd {
        MeditationCommands::Types { .. } => Ok(()),
        MeditationCommands::Log { type_id, content_id, minutes, mood_before, mood_after } => {
            let data = client
                .post(
                    "/api/meditation",
                    &json!({
                        "type_id": type_id,
                        "content_id": content_id,
                        "duration_minutes": minutes,
                        "mood_before": mood_before,
                        "mood_after": mood_after,
                    }),
                )
                .await?;
            output_success(
                &output_format,
                &format!("Logged {} min of meditation", minutes),
                Some(json!({ "data": data })),
            )?;
            output_new_badges(&output_format, &data);
            Ok(())
        }
        MeditationCommands::List { from, to } => {
            let mut query = Vec::new();
            if let Some(from) = from {
                query.push(("from", from.to_string()));
            }
            if let Some(to) = to {
                query.push(("to", to.to_string()));
            }
            let sessions = client.get("/api/meditation", &query).await?;
            output_data(&output_format, &sessions)
        }
        MeditationCommands::Summary { days } => {
            let summary = client
                .get("/api/meditation/summary", &[("days", days.to_string())])
                .await?;
            output_data(&output_format, &summary)
        }
    }
}
