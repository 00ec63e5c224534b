use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gcapi_calendar::{CalendarApi, Payload, TokenSet};

#[derive(Parser)]
#[command(name = "gcapi", about = "Minimal Google Calendar API client", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the consent URL to visit in a browser
    AuthUrl,

    /// Exchange an authorization code and print the resulting tokens as JSON
    Exchange { code: String },

    /// Send one authorized request and print the decoded body
    Request {
        /// get, post, put or delete
        method: String,
        /// Path under the API base URL, e.g. /users/me/calendarList
        path: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
        #[arg(long, env = "GCAPI_ACCESS_TOKEN")]
        access_token: String,
        #[arg(long, env = "GCAPI_REFRESH_TOKEN")]
        refresh_token: Option<String>,
        /// Remaining lifetime of the access token in seconds
        #[arg(long, default_value_t = 3600)]
        expires_in: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    gcapi_core::init()?;
    let cli = Cli::parse();

    let (config, _) = gcapi_core::Config::load_validated()?;
    let api = CalendarApi::from_config(&config).context("Failed to build API client")?;
    tracing::debug!("Client ready for {}", api.base_url());

    match cli.command {
        Command::AuthUrl => {
            println!("{}", api.authorization_url());
        }
        Command::Exchange { code } => {
            api.exchange_code(&code)
                .await
                .context("Authorization code exchange failed")?;
            let tokens = api.token().await.context("No token after exchange")?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Command::Request {
            method,
            path,
            data,
            access_token,
            refresh_token,
            expires_in,
        } => {
            api.set_token(TokenSet::expiring_in(access_token, refresh_token, expires_in))
                .await;

            let data = data
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .context("--data is not valid JSON")?;

            let response = api.request(&method, &path, data.as_ref()).await?;
            tracing::info!(status = response.status, "{}", api);

            match response.payload {
                Payload::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Payload::Empty => println!("(empty response, HTTP {})", response.status),
                Payload::Malformed { body, error } => {
                    eprintln!("warning: response is not JSON ({})", error);
                    println!("{}", body);
                }
            }
        }
    }

    Ok(())
}
