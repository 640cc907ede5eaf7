pub mod openai;
pub mod unsplash;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiChat;
pub use unsplash::UnsplashSearch;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid provider response: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_object: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSearchRequest {
    pub query: String,
    pub per_page: u32,
    pub orientation: Orientation,
}

/// A chat-completion provider. Returns the first choice's text, which may be
/// empty; callers decide whether that is a failure.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// A photo-search provider returning image URLs in relevance order.
#[async_trait]
pub trait PhotoSearchTransport: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn search(
        &self,
        api_key: &str,
        request: &PhotoSearchRequest,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Pulls a human-readable message out of a provider error body.
pub(crate) fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.pointer("/errors/0").and_then(|v| v.as_str()))
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(message) = message {
            return message.to_string();
        }
        return crate::utils::http::truncate_for_log(&value.to_string(), 500);
    }

    crate::utils::http::truncate_for_log(trimmed, 500)
}
