use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{Credentials, ImageSettings};
use crate::llm::{Orientation, PhotoSearchRequest, PhotoSearchTransport};
use crate::lookup::error::LookupError;
use crate::lookup::normalizer::expand;
use crate::utils::timing::log_provider_timing;

const MAX_PER_PAGE: u32 = 30;

/// Finds illustrative photos for a term. Provider failures never reach the
/// caller: every path ends in provider results or the configured defaults.
#[derive(Clone)]
pub struct ImageLookupClient {
    transport: Arc<dyn PhotoSearchTransport>,
    settings: ImageSettings,
}

impl ImageLookupClient {
    pub fn new(transport: Arc<dyn PhotoSearchTransport>, settings: ImageSettings) -> Self {
        ImageLookupClient {
            transport,
            settings,
        }
    }

    pub fn default_count(&self) -> usize {
        self.settings.default_count
    }

    fn candidates(&self, term: &str) -> Vec<String> {
        let mut candidates = expand(term);
        candidates.truncate(self.settings.max_candidates.max(1));
        candidates
    }

    /// One search call. Errors are logged and read as "no results".
    async fn search(
        &self,
        api_key: &str,
        query: &str,
        per_page: u32,
        orientation: Orientation,
    ) -> Vec<String> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let request = PhotoSearchRequest {
            query: query.to_string(),
            per_page,
            orientation,
        };
        let provider = self.transport.provider_name();
        match log_provider_timing(provider, "photo_search", 1, || {
            self.transport.search(api_key, &request)
        })
        .await
        {
            Ok(urls) => urls,
            Err(err) => {
                warn!("Image search for '{}' failed: {}", query, err);
                Vec::new()
            }
        }
    }

    pub async fn fetch_one(&self, term: &str, credentials: &Credentials) -> String {
        let Some(api_key) = credentials.image_key() else {
            warn!("Unsplash API key is not set; using the default image.");
            return self.settings.default_image_url.clone();
        };

        let per_page = self.settings.single_per_page.clamp(1, MAX_PER_PAGE);
        for candidate in self.candidates(term) {
            let urls = self
                .search(api_key, &candidate, per_page, Orientation::Landscape)
                .await;
            if let Some(url) = urls.into_iter().next() {
                debug!("Image for '{}' found with candidate '{}'", term, candidate);
                return url;
            }
        }

        info!(
            "No candidate matched '{}'; trying broad query '{}'",
            term, self.settings.fallback_query
        );
        let urls = self
            .search(
                api_key,
                &self.settings.fallback_query,
                per_page,
                Orientation::Landscape,
            )
            .await;
        urls.into_iter()
            .next()
            .unwrap_or_else(|| self.settings.default_image_url.clone())
    }

    pub async fn fetch_many(
        &self,
        term: &str,
        credentials: &Credentials,
        count: usize,
    ) -> Result<Vec<String>, LookupError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let Some(api_key) = credentials.image_key() else {
            warn!("Unsplash API key is not set; using the default image pool.");
            return self.default_pool(term, count);
        };

        let per_page = u32::try_from(count.saturating_mul(2))
            .unwrap_or(MAX_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let mut collected = Vec::with_capacity(count);
        let mut seen = HashSet::new();

        for candidate in self.candidates(term) {
            if collected.len() >= count {
                break;
            }
            let urls = self
                .search(api_key, &candidate, per_page, Orientation::Portrait)
                .await;
            push_unique(&mut collected, &mut seen, urls);
        }

        if collected.len() < count {
            info!(
                "Collected {}/{} images for '{}'; topping up with '{}'",
                collected.len(),
                count,
                term,
                self.settings.fallback_query
            );
            let urls = self
                .search(
                    api_key,
                    &self.settings.fallback_query,
                    per_page,
                    Orientation::Portrait,
                )
                .await;
            push_unique(&mut collected, &mut seen, urls);
        }

        if collected.is_empty() {
            return self.default_pool(term, count);
        }
        Ok(cycle_to(&collected, count))
    }

    fn default_pool(&self, term: &str, count: usize) -> Result<Vec<String>, LookupError> {
        if self.settings.fallback_pool.is_empty() {
            return Err(LookupError::NoResults(term.trim().to_string()));
        }
        Ok(cycle_to(&self.settings.fallback_pool, count))
    }
}

fn push_unique(collected: &mut Vec<String>, seen: &mut HashSet<String>, urls: Vec<String>) {
    for url in urls {
        if seen.insert(url.clone()) {
            collected.push(url);
        }
    }
}

fn cycle_to(urls: &[String], count: usize) -> Vec<String> {
    urls.iter().cycle().take(count).cloned().collect()
}
