pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "mindful")]
#[command(about = "MindfulSpace CLI - log sleep, meditation and exercise from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "API server selection and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Account registration and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Sleep journal (queued offline when the server is unreachable)")]
    Sleep {
        #[command(subcommand)]
        cmd: commands::sleep::SleepCommands,
    },

    #[command(about = "Meditation sessions")]
    Meditation {
        #[command(subcommand)]
        cmd: commands::meditation::MeditationCommands,
    },

    #[command(about = "Exercise sessions")]
    Exercise {
        #[command(subcommand)]
        cmd: commands::exercise::ExerciseCommands,
    },

    #[command(about = "World Hub overview across all trackers")]
    Hub {
        #[arg(long, default_value_t = 7, help = "Window in days")]
        days: i64,
    },

    #[command(about = "Offline sleep queue")]
    Sync {
        #[command(subcommand)]
        cmd: commands::sync::SyncCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Sleep { cmd } => commands::sleep::handle(cmd, output_format).await,
        Commands::Meditation { cmd } => commands::meditation::handle(cmd, output_format).await,
        Commands::Exercise { cmd } => commands::exercise::handle(cmd, output_format).await,
        Commands::Hub { days } => commands::hub::handle(days, output_format).await,
        Commands::Sync { cmd } => commands::sync::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sleep_log_with_global_json_flag() {
        let cli = Cli::try_parse_from(["mindful", "sleep", "log", "--hours", "7.5", "--quality", "4", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Sleep { .. }));
    }
}
