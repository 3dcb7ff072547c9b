use std::io::{self, BufRead, Write};

use chrono::Utc;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::config::{load_config, save_config, CliConfig, StoredSession};
use crate::cli::utils::{output_data, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account and log in")]
    Register {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (reads MINDFUL_PASSWORD or prompts if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Display name")]
        display_name: Option<String>,
        #[arg(long, help = "Preferred locale, e.g. en or fr")]
        locale: Option<String>,
    },

    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (reads MINDFUL_PASSWORD or prompts if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored tokens")]
    Logout,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_config()?;

    match cmd {
        AuthCommands::Register { email, password, display_name, locale } => {
            let password = resolve_password(password)?;
            let client = ApiClient::new(&config.server_url, None)?;
            let data = client
                .post(
                    "/auth/register",
                    &json!({
                        "email": email,
                        "password": password,
                        "display_name": display_name,
                        "locale": locale,
                    }),
                )
                .await?;

            let email = store_session(&mut config, &data)?;
            output_success(&output_format, &format!("Registered and logged in as {}", email), Some(json!({ "email": email })))
        }
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password)?;
            let client = ApiClient::new(&config.server_url, None)?;
            let data = client
                .post("/auth/login", &json!({ "email": email, "password": password }))
                .await?;

            let email = store_session(&mut config, &data)?;
            output_success(&output_format, &format!("Logged in as {}", email), Some(json!({ "email": email })))
        }
        AuthCommands::Logout => {
            config.session = None;
            save_config(&config)?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Refresh => {
            let refresh_token = config.require_session()?.refresh_token.clone();
            let client = ApiClient::new(&config.server_url, None)?;
            let data = client
                .post("/auth/refresh", &json!({ "refresh_token": refresh_token }))
                .await?;

            let email = store_session(&mut config, &data)?;
            output_success(&output_format, &format!("Tokens refreshed for {}", email), None)
        }
        AuthCommands::Whoami => {
            config.require_session()?;
            let client = ApiClient::from_config(&config)?;
            let user = client.get("/api/auth/whoami", &[]).await?;
            output_data(&output_format, &user)
        }
    }
}

/// Persist the token pair from a `Session` payload and return the account email.
fn store_session(config: &mut CliConfig, data: &Value) -> anyhow::Result<String> {
    let field = |name: &str| -> anyhow::Result<String> {
        data.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Server response is missing '{}'", name))
    };

    let email = data
        .pointer("/user/email")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Server response is missing 'user.email'"))?;

    config.session = Some(StoredSession {
        email: email.clone(),
        access_token: field("access_token")?,
        refresh_token: field("refresh_token")?,
        logged_in_at: Utc::now(),
    });
    save_config(config)?;
    Ok(email)
}

fn resolve_password(explicit: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = explicit.or_else(|| std::env::var("MINDFUL_PASSWORD").ok()) {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
