use anyhow::{anyhow, Result};
use tracing::info;

use crate::config::Credentials;
use crate::handlers::responses::{
    missing_image_key_note, render_error, render_style_grid, render_term, render_trend,
};
use crate::state::AppState;
use crate::utils::timing::start_query_timer;

const CLEAR_KEY: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Trend(String),
    Brand(String),
    Style(String),
    /// `None` keeps the saved key, `Some("")` clears it.
    Keys {
        text_api_key: Option<String>,
        image_api_key: Option<String>,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

pub const HELP_TEXT: &str = "
FASHION TREND-SETTER

/trend <term>   Explain a fashion trend or term, with a related image
/brand <name>   Look up a brand: definition, signature items, related terms
/style <query>  Show a grid of styling images (e.g. minimal styling, blue coat)
/keys <openai-key|-> [unsplash-key|-]
                Save API keys for this session ('-' clears a key)
/help           Show this help message
/quit           Exit

A line without a command is treated as /trend.
";

fn key_argument(value: Option<&str>) -> Option<String> {
    value.map(|value| {
        if value == CLEAR_KEY {
            String::new()
        } else {
            value.to_string()
        }
    })
}

pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(Command::Trend(line.to_string())));
    }

    let (name, argument) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let require_argument = |usage: &str| -> Result<String> {
        if argument.is_empty() {
            Err(anyhow!("Please enter a search term. Usage: {usage}"))
        } else {
            Ok(argument.to_string())
        }
    };

    let command = match name.to_lowercase().as_str() {
        "/trend" => Command::Trend(require_argument("/trend <term>")?),
        "/brand" => Command::Brand(require_argument("/brand <name>")?),
        "/style" => Command::Style(require_argument("/style <query>")?),
        "/keys" => {
            let mut parts = argument.split_whitespace();
            let text_api_key = key_argument(parts.next());
            let image_api_key = key_argument(parts.next());
            if text_api_key.is_none() {
                return Err(anyhow!(
                    "Usage: /keys <openai-key|-> [unsplash-key|-]"
                ));
            }
            if parts.next().is_some() {
                return Err(anyhow!("/keys takes at most two keys"));
            }
            Command::Keys {
                text_api_key,
                image_api_key,
            }
        }
        "/help" | "/start" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => return Err(anyhow!("Unknown command: {other}. Type /help for usage.")),
    };
    Ok(Some(command))
}

fn with_image_warning(credentials: &Credentials, mut reply: String) -> String {
    if credentials.image_key().is_none() {
        reply.push_str(&missing_image_key_note());
        reply.push('\n');
    }
    reply
}

pub async fn trend_handler(state: &AppState, term: &str) -> String {
    let mut timer = start_query_timer("trend", term);
    let credentials = state.session.credentials();

    match state.text.fetch_trend(term, &credentials).await {
        Ok(info) => {
            let image_url = state.images.fetch_one(term, &credentials).await;
            with_image_warning(&credentials, render_trend(term, &info, &image_url))
        }
        Err(err) => {
            timer.mark_status("error", Some(err.to_string()));
            render_error("looking up the trend", &err)
        }
    }
}

pub async fn brand_handler(state: &AppState, name: &str) -> String {
    let mut timer = start_query_timer("brand", name);
    let credentials = state.session.credentials();

    match state.text.fetch_term(name, &credentials).await {
        Ok(info) => {
            let image_query = format!("{} brand", name.trim());
            let image_url = state.images.fetch_one(&image_query, &credentials).await;
            with_image_warning(&credentials, render_term(name, &info, &image_url))
        }
        Err(err) => {
            timer.mark_status("error", Some(err.to_string()));
            render_error("looking up the brand", &err)
        }
    }
}

pub async fn style_handler(state: &AppState, query: &str) -> String {
    let mut timer = start_query_timer("style", query);
    let credentials = state.session.credentials();
    let count = state.images.default_count();

    match state.images.fetch_many(query, &credentials, count).await {
        Ok(urls) => with_image_warning(&credentials, render_style_grid(query, &urls)),
        Err(err) => {
            timer.mark_status("error", Some(err.to_string()));
            render_error("searching styling images", &err)
        }
    }
}

pub fn keys_handler(
    state: &AppState,
    text_api_key: Option<String>,
    image_api_key: Option<String>,
) -> String {
    let current = state.session.credentials();
    let updated = Credentials::new(
        text_api_key.unwrap_or(current.text_api_key),
        image_api_key.unwrap_or(current.image_api_key),
    );
    state.session.save(updated.clone());
    info!("Session API keys saved: {:?}", updated);

    let status = |present: bool| if present { "set" } else { "not set" };
    format!(
        "API keys saved. OpenAI: {}, Unsplash: {}.\n",
        status(updated.text_key().is_some()),
        status(updated.image_key().is_some())
    )
}

pub async fn handle_command(state: &AppState, command: Command) -> Outcome {
    let reply = match command {
        Command::Trend(term) => trend_handler(state, &term).await,
        Command::Brand(name) => brand_handler(state, &name).await,
        Command::Style(query) => style_handler(state, &query).await,
        Command::Keys {
            text_api_key,
            image_api_key,
        } => keys_handler(state, text_api_key, image_api_key),
        Command::Help => HELP_TEXT.trim_start().to_string(),
        Command::Quit => return Outcome::Quit,
    };
    Outcome::Reply(reply)
}
