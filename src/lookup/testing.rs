use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::llm::{
    ChatRequest, ChatTransport, PhotoSearchRequest, PhotoSearchTransport, ProviderError,
};

pub(crate) fn server_error() -> ProviderError {
    ProviderError::Status {
        status: 503,
        detail: "upstream unavailable".to_string(),
    }
}

/// Chat double that replays scripted replies and records every request.
#[derive(Default)]
pub(crate) struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        ScriptedChat {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatTransport for ScriptedChat {
    fn provider_name(&self) -> &'static str {
        "scripted-chat"
    }

    async fn complete(&self, _api_key: &str, request: &ChatRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Photo-search double keyed by exact query string. Unknown queries return
/// no results; queries listed in `failing` return a provider error.
#[derive(Default)]
pub(crate) struct ScriptedPhotos {
    results: Vec<(String, Vec<String>)>,
    failing: Vec<String>,
    pub requests: Mutex<Vec<PhotoSearchRequest>>,
}

impl ScriptedPhotos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, urls: &[&str]) -> Self {
        self.results.push((
            query.to_string(),
            urls.iter().map(|url| url.to_string()).collect(),
        ));
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.query.clone())
            .collect()
    }
}

#[async_trait]
impl PhotoSearchTransport for ScriptedPhotos {
    fn provider_name(&self) -> &'static str {
        "scripted-photos"
    }

    async fn search(
        &self,
        _api_key: &str,
        request: &PhotoSearchRequest,
    ) -> Result<Vec<String>, ProviderError> {
        self.requests.lock().push(request.clone());
        if self.failing.contains(&request.query) {
            return Err(server_error());
        }
        Ok(self
            .results
            .iter()
            .find(|(query, _)| *query == request.query)
            .map(|(_, urls)| {
                urls.iter()
                    .take(request.per_page as usize)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default())
    }
}
