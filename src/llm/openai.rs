use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm::{summarize_error_body, ChatRequest, ChatTransport, ProviderError};

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(client: Client, base_url: &str) -> Self {
        OpenAiChat {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn build_payload(request: &ChatRequest) -> Value {
    let mut payload = json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user", "content": request.user_prompt },
        ],
    });
    if let Some(temperature) = request.temperature {
        payload["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        payload["max_tokens"] = json!(max_tokens);
    }
    if request.json_object {
        payload["response_format"] = json!({ "type": "json_object" });
    }
    payload
}

fn first_choice_content(response: ChatCompletionResponse) -> String {
    response
        .choices
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default()
}

#[async_trait]
impl ChatTransport for OpenAiChat {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ProviderError> {
        let payload = build_payload(request);
        debug!(
            "OpenAI request: model={}, json_object={}, max_tokens={:?}",
            request.model, request.json_object, request.max_tokens
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = summarize_error_body(&body);
            warn!("OpenAI API error: status={}, detail={}", status, detail);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|err| ProviderError::InvalidBody(err.to_string()))?;
        let content = first_choice_content(parsed);
        debug!("OpenAI response received: {} chars", content.chars().count());
        Ok(content)
    }
}
