use std::fmt;

use thiserror::Error;

use crate::llm::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Text,
    Image,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("OpenAI"),
            Self::Image => f.write_str("Unsplash"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0} API key is not set; save one with /keys first")]
    MissingCredential(CredentialKind),
    #[error("provider call failed after {attempts} attempt(s): {source}")]
    ProviderError {
        attempts: usize,
        #[source]
        source: ProviderError,
    },
    #[error("provider returned an empty response after {attempts} attempt(s)")]
    EmptyResponse { attempts: usize },
    #[error("provider response is not a valid JSON object: {0}")]
    MalformedResponse(String),
    #[error("provider response is missing the required '{missing_field}' field")]
    IncompleteResponse { missing_field: &'static str },
    #[error("no images are available for '{0}'")]
    NoResults(String),
}

impl LookupError {
    /// Transport failures and empty bodies are worth another attempt; schema
    /// problems and missing keys are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LookupError::ProviderError { .. } | LookupError::EmptyResponse { .. }
        )
    }
}
