use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::{
    render_prompt, Credentials, TextSettings, TERM_SYSTEM_PROMPT, TERM_USER_PROMPT,
    TREND_SYSTEM_PROMPT, TREND_USER_PROMPT,
};
use crate::llm::{ChatRequest, ChatTransport};
use crate::lookup::error::{CredentialKind, LookupError};
use crate::lookup::types::{TermInfo, TrendInfo};
use crate::utils::retry::retry_with;
use crate::utils::timing::log_provider_timing;

/// Looks up trend descriptions and structured term records from the chat
/// provider.
#[derive(Clone)]
pub struct TextInsightClient {
    transport: Arc<dyn ChatTransport>,
    settings: TextSettings,
}

impl TextInsightClient {
    pub fn new(transport: Arc<dyn ChatTransport>, settings: TextSettings) -> Self {
        TextInsightClient {
            transport,
            settings,
        }
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
        operation: &str,
        attempt: usize,
    ) -> Result<String, LookupError> {
        log_provider_timing(self.transport.provider_name(), operation, attempt, || {
            self.transport.complete(api_key, request)
        })
        .await
        .map_err(|source| LookupError::ProviderError {
            attempts: attempt,
            source,
        })
    }

    pub async fn fetch_trend(
        &self,
        term: &str,
        credentials: &Credentials,
    ) -> Result<TrendInfo, LookupError> {
        let api_key = credentials
            .text_key()
            .ok_or(LookupError::MissingCredential(CredentialKind::Text))?;
        let request = ChatRequest {
            model: self.settings.model.clone(),
            system_prompt: TREND_SYSTEM_PROMPT.to_string(),
            user_prompt: render_prompt(TREND_USER_PROMPT, term),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            json_object: false,
        };
        info!("Fetching trend description for '{}'", term.trim());

        let request = &request;
        let description = retry_with(
            &self.settings.trend_retry,
            "trend lookup",
            LookupError::is_retryable,
            move |attempt| async move {
                let content = self.complete(api_key, request, "trend", attempt).await?;
                let content = content.trim();
                if content.is_empty() {
                    return Err(LookupError::EmptyResponse { attempts: attempt });
                }
                Ok(content.to_string())
            },
        )
        .await?;

        Ok(TrendInfo { description })
    }

    pub async fn fetch_term(
        &self,
        term: &str,
        credentials: &Credentials,
    ) -> Result<TermInfo, LookupError> {
        let api_key = credentials
            .text_key()
            .ok_or(LookupError::MissingCredential(CredentialKind::Text))?;
        let request = ChatRequest {
            model: self.settings.model.clone(),
            system_prompt: TERM_SYSTEM_PROMPT.to_string(),
            user_prompt: render_prompt(TERM_USER_PROMPT, term),
            temperature: None,
            max_tokens: None,
            json_object: true,
        };
        info!("Fetching term record for '{}'", term.trim());

        // Only transport failures are retried here; the body is validated once.
        let request = &request;
        let body = retry_with(
            &self.settings.term_retry,
            "term lookup",
            |err: &LookupError| matches!(err, LookupError::ProviderError { .. }),
            move |attempt| async move { self.complete(api_key, request, "term", attempt).await },
        )
        .await?;

        parse_term_info(&body).inspect_err(|err| {
            warn!("Rejected term response for '{}': {}", term.trim(), err);
        })
    }
}

pub(crate) fn parse_term_info(body: &str) -> Result<TermInfo, LookupError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|err| LookupError::MalformedResponse(err.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(LookupError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    if let Some(missing_field) = TermInfo::REQUIRED_FIELDS
        .into_iter()
        .find(|field| !object.contains_key(*field))
    {
        return Err(LookupError::IncompleteResponse { missing_field });
    }

    serde_json::from_value(value).map_err(|err| LookupError::MalformedResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::lookup::testing::{server_error, ScriptedChat};
    use crate::utils::retry::RetryPolicy;

    const VALID_TERM: &str = r#"{
        "definition": "An Italian luxury house.",
        "examples": ["Horsebit loafer", "Jackie bag"],
        "brands": ["Gucci"],
        "related_terms": ["quiet luxury", "logomania"]
    }"#;

    fn settings() -> TextSettings {
        TextSettings {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            trend_retry: RetryPolicy::new(3, Duration::ZERO),
            term_retry: RetryPolicy::new(3, Duration::ZERO),
        }
    }

    fn client(chat: &Arc<ScriptedChat>) -> TextInsightClient {
        TextInsightClient::new(chat.clone(), settings())
    }

    fn keyed() -> Credentials {
        Credentials::new("sk-test", "")
    }

    #[tokio::test]
    async fn missing_text_key_makes_no_calls() {
        let chat = Arc::new(ScriptedChat::new(vec![Ok("unused".to_string())]));
        let client = client(&chat);
        let no_keys = Credentials::default();

        let trend = client.fetch_trend("Y2K", &no_keys).await;
        let term = client.fetch_term("Gucci", &no_keys).await;

        assert!(matches!(
            trend,
            Err(LookupError::MissingCredential(CredentialKind::Text))
        ));
        assert!(matches!(
            term,
            Err(LookupError::MissingCredential(CredentialKind::Text))
        ));
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn trend_succeeds_on_third_attempt_after_empty_bodies() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok(String::new()),
            Ok("   \n".to_string()),
            Ok("  Y2K revives late-90s pop styling.  ".to_string()),
        ]));

        let info = client(&chat).fetch_trend("Y2K", &keyed()).await.unwrap();

        assert_eq!(info.description, "Y2K revives late-90s pop styling.");
        assert_eq!(chat.calls(), 3);
    }

    #[tokio::test]
    async fn trend_gives_up_after_three_empty_bodies() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok(String::new()),
            Ok(String::new()),
            Ok(String::new()),
            Ok("never reached".to_string()),
        ]));

        let result = client(&chat).fetch_trend("Y2K", &keyed()).await;

        assert!(matches!(
            result,
            Err(LookupError::EmptyResponse { attempts: 3 })
        ));
        assert_eq!(chat.calls(), 3);
    }

    #[tokio::test]
    async fn trend_retries_provider_errors() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Err(server_error()),
            Ok("Gorpcore is outdoor gear worn in the city.".to_string()),
        ]));

        let info = client(&chat).fetch_trend("gorpcore", &keyed()).await.unwrap();

        assert!(info.description.starts_with("Gorpcore"));
        assert_eq!(chat.calls(), 2);
    }

    #[tokio::test]
    async fn trend_request_uses_expert_prompt_and_sampling() {
        let chat = Arc::new(ScriptedChat::new(vec![Ok("ok".to_string())]));

        client(&chat).fetch_trend(" Y2K ", &keyed()).await.unwrap();

        let requests = chat.requests.lock();
        let request = &requests[0];
        assert!(request.system_prompt.contains("fashion domain expert"));
        assert!(request.user_prompt.ends_with(": Y2K"));
        assert_eq!(request.max_tokens, Some(500));
        assert!(!request.json_object);
    }

    #[tokio::test]
    async fn term_parses_complete_record() {
        let chat = Arc::new(ScriptedChat::new(vec![Ok(VALID_TERM.to_string())]));

        let info = client(&chat).fetch_term("Gucci", &keyed()).await.unwrap();

        assert_eq!(info.brands, vec!["Gucci".to_string()]);
        assert_eq!(info.examples.len(), 2);
        assert!(chat.requests.lock()[0].json_object);
    }

    #[tokio::test]
    async fn term_missing_brands_is_incomplete_and_not_retried() {
        let body = r#"{"definition": "d", "examples": [], "related_terms": []}"#;
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok(body.to_string()),
            Ok(VALID_TERM.to_string()),
        ]));

        let result = client(&chat).fetch_term("Gucci", &keyed()).await;

        assert!(matches!(
            result,
            Err(LookupError::IncompleteResponse {
                missing_field: "brands"
            })
        ));
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn term_non_json_is_malformed_and_not_retried() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok("Gucci is an Italian brand.".to_string()),
            Ok(VALID_TERM.to_string()),
        ]));

        let result = client(&chat).fetch_term("Gucci", &keyed()).await;

        assert!(matches!(result, Err(LookupError::MalformedResponse(_))));
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn term_retries_transport_errors_then_surfaces_them() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Err(server_error()),
            Err(server_error()),
            Err(server_error()),
        ]));

        let result = client(&chat).fetch_term("Gucci", &keyed()).await;

        assert!(matches!(
            result,
            Err(LookupError::ProviderError { attempts: 3, .. })
        ));
        assert_eq!(chat.calls(), 3);
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        let body = r#"{"definition": "d", "examples": "not a list", "brands": [], "related_terms": []}"#;
        assert!(matches!(
            parse_term_info(body),
            Err(LookupError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_term_info("[1, 2]"),
            Err(LookupError::MalformedResponse(_))
        ));
    }

    #[test]
    fn fields_are_checked_in_declared_order() {
        assert!(matches!(
            parse_term_info("{}"),
            Err(LookupError::IncompleteResponse {
                missing_field: "definition"
            })
        ));
    }
}
