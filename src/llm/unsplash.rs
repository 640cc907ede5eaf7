use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::llm::{summarize_error_body, PhotoSearchRequest, PhotoSearchTransport, ProviderError};

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    results: Option<Vec<UnsplashPhoto>>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: Option<UnsplashUrls>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: Option<String>,
}

fn extract_urls(payload: UnsplashSearchResponse) -> Vec<String> {
    payload
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|photo| photo.urls.and_then(|urls| urls.regular))
        .filter(|url| !url.trim().is_empty())
        .collect()
}

/// Unsplash `/search/photos` client.
#[derive(Debug, Clone)]
pub struct UnsplashSearch {
    client: Client,
    endpoint: String,
}

impl UnsplashSearch {
    pub fn new(client: Client, endpoint: &str) -> Self {
        UnsplashSearch {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl PhotoSearchTransport for UnsplashSearch {
    fn provider_name(&self) -> &'static str {
        "unsplash"
    }

    async fn search(
        &self,
        api_key: &str,
        request: &PhotoSearchRequest,
    ) -> Result<Vec<String>, ProviderError> {
        info!(
            "Calling Unsplash search with query: {} (per_page={}, orientation={})",
            request.query,
            request.per_page,
            request.orientation.as_str()
        );

        let per_page = request.per_page.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Client-ID {api_key}"))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", request.query.as_str()),
                ("per_page", per_page.as_str()),
                ("orientation", request.orientation.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = summarize_error_body(&body);
            warn!("Unsplash API error: status={}, detail={}", status, detail);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let data: UnsplashSearchResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::InvalidBody(err.to_string()))?;
        let urls = extract_urls(data);
        debug!("Unsplash returned {} image(s) for '{}'", urls.len(), request.query);
        Ok(urls)
    }
}
