use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

mod config;
mod handlers;
mod llm;
mod lookup;
mod state;
mod utils;

use config::Config;
use handlers::commands::{handle_command, parse_command, Outcome, HELP_TEXT};
use llm::{OpenAiChat, UnsplashSearch};
use lookup::{ImageLookupClient, TextInsightClient};
use state::{AppState, SessionState};
use utils::http::build_http_client;
use utils::logging::init_logging;

const PROMPT: &str = "fashion> ";

fn build_state(config: &Config) -> Result<AppState> {
    let http = build_http_client(config.http_timeout)?;
    let chat = OpenAiChat::new(http.clone(), &config.openai_base_url);
    let photos = UnsplashSearch::new(http, &config.unsplash_search_endpoint);

    Ok(AppState::new(
        SessionState::new(config.initial_credentials.clone()),
        TextInsightClient::new(Arc::new(chat), config.text.clone()),
        ImageLookupClient::new(Arc::new(photos), config.image.clone()),
    ))
}

async fn run_console(state: AppState) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(HELP_TEXT.trim_start().as_bytes()).await?;
    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                stdout.write_all(format!("{err}\n").as_bytes()).await?;
                continue;
            }
        };

        match handle_command(&state, command).await {
            Outcome::Reply(reply) => stdout.write_all(reply.as_bytes()).await?,
            Outcome::Quit => break,
        }
    }

    stdout.write_all(b"Bye.\n").await?;
    stdout.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::load()?;
    let _guards = init_logging(&config.log_level);
    for warning in &config.warnings {
        warn!("{warning}");
    }

    info!(
        "Starting Fashion Trend-Setter (model={}, timeout={}s, credentials={:?})",
        config.text.model,
        config.http_timeout.as_secs(),
        config.initial_credentials
    );

    let state = build_state(&config)?;
    if let Err(err) = run_console(state).await {
        error!("Console loop failed: {err}");
        return Err(err);
    }
    Ok(())
}
