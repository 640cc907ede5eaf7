use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};
use url::Url;

use crate::utils::retry::RetryPolicy;

pub const DEFAULT_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1492707892479-7bc8d5a4ee93?w=600";

pub const DEFAULT_IMAGE_POOL: [&str; 6] = [
    "https://images.unsplash.com/photo-1492707892479-7bc8d5a4ee93",
    "https://images.unsplash.com/photo-1490481651871-ab68de25d43d",
    "https://images.unsplash.com/photo-1445205170230-053b83016050",
    "https://images.unsplash.com/photo-1479064555552-3ef4979f8908",
    "https://images.unsplash.com/photo-1485968579580-b6d095142e6e",
    "https://images.unsplash.com/photo-1515886657613-9f3515b0c78f",
];

pub const TREND_SYSTEM_PROMPT: &str = "You are a fashion domain expert who explains fashion terms and trends. Describe the term or trend the user gives you in detail: what it means, where it came from, its key characteristics and how it is worn today. Answer in the same language as the user's term.";

pub const TREND_USER_PROMPT: &str =
    "Explain the meaning and characteristics of this fashion term or trend: {term}";

pub const TERM_SYSTEM_PROMPT: &str = "You are a fashion domain expert. Provide detailed information about fashion terms and brands. Your answer must always be a single valid JSON object.";

pub const TERM_USER_PROMPT: &str = r#"Tell me about this fashion term or brand: {term}. Respond ONLY with a JSON object in exactly this shape, with no extra text: {"definition": "definition", "examples": ["example 1", "example 2"], "brands": ["brand 1", "brand 2"], "related_terms": ["related term 1", "related term 2"]}"#;

/// Session secrets. Blank keys are treated the same as absent ones.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub text_api_key: String,
    pub image_api_key: String,
}

impl Credentials {
    pub fn new(text_api_key: impl Into<String>, image_api_key: impl Into<String>) -> Self {
        Credentials {
            text_api_key: text_api_key.into(),
            image_api_key: image_api_key.into(),
        }
    }

    pub fn text_key(&self) -> Option<&str> {
        non_blank(&self.text_api_key)
    }

    pub fn image_key(&self) -> Option<&str> {
        non_blank(&self.image_api_key)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn redact(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        "[redacted]"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("text_api_key", &redact(&self.text_api_key))
            .field("image_api_key", &redact(&self.image_api_key))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TextSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub trend_retry: RetryPolicy,
    pub term_retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub single_per_page: u32,
    pub default_count: usize,
    pub max_candidates: usize,
    pub fallback_query: String,
    pub default_image_url: String,
    pub fallback_pool: Vec<String>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        ImageSettings {
            single_per_page: 15,
            default_count: 6,
            max_candidates: 5,
            fallback_query: "fashion style".to_string(),
            default_image_url: DEFAULT_IMAGE_URL.to_string(),
            fallback_pool: DEFAULT_IMAGE_POOL.iter().map(|url| url.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub initial_credentials: Credentials,
    pub openai_base_url: String,
    pub unsplash_search_endpoint: String,
    pub http_timeout: Duration,
    pub text: TextSettings,
    pub image: ImageSettings,
    pub warnings: Vec<String>,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn validate_http_url(name: &str, value: String) -> Result<String> {
    let parsed = Url::parse(value.trim()).map_err(|err| anyhow!("{name} is not a valid URL: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(value.trim().to_string()),
        other => Err(anyhow!("{name} must use http or https, got '{other}'")),
    }
}

fn clamp_setting(name: &str, value: usize, min: usize, max: usize, warnings: &mut Vec<String>) -> usize {
    if !(min..=max).contains(&value) {
        warnings.push(format!(
            "{name}={value} is out of range {min}..={max}; clamping."
        ));
    }
    value.clamp(min, max)
}

impl TextSettings {
    pub fn from_env() -> Result<Self> {
        let max_attempts = env_usize("TEXT_MAX_ATTEMPTS", 3);
        let settings = TextSettings {
            model: env_string("OPENAI_MODEL", "gpt-3.5-turbo"),
            temperature: env_f32("OPENAI_TEMPERATURE", 0.7),
            max_tokens: env_u32("OPENAI_MAX_TOKENS", 500),
            trend_retry: RetryPolicy::new(
                max_attempts,
                Duration::from_millis(env_u64("TREND_RETRY_DELAY_MS", 1000)),
            ),
            term_retry: RetryPolicy::new(
                max_attempts,
                Duration::from_millis(env_u64("TERM_RETRY_DELAY_MS", 0)),
            ),
        };
        if settings.model.trim().is_empty() {
            return Err(anyhow!("OPENAI_MODEL must not be empty"));
        }
        Ok(settings)
    }
}

impl ImageSettings {
    /// Out-of-range values are clamped; the notes go into `warnings` so they
    /// can be logged once the subscriber is installed.
    pub fn from_env(warnings: &mut Vec<String>) -> Self {
        let defaults = ImageSettings::default();
        let fallback_pool = env::var("FALLBACK_IMAGE_POOL")
            .map(|value| parse_csv(&value))
            .unwrap_or_else(|_| defaults.fallback_pool.clone());
        if fallback_pool.is_empty() {
            warnings.push(
                "FALLBACK_IMAGE_POOL is empty; image lookups may report no results.".to_string(),
            );
        }

        let single_per_page = env_u32("IMAGE_SINGLE_PER_PAGE", defaults.single_per_page);
        ImageSettings {
            single_per_page: clamp_setting(
                "IMAGE_SINGLE_PER_PAGE",
                single_per_page as usize,
                1,
                30,
                warnings,
            ) as u32,
            default_count: clamp_setting(
                "IMAGE_DEFAULT_COUNT",
                env_usize("IMAGE_DEFAULT_COUNT", defaults.default_count),
                1,
                usize::MAX,
                warnings,
            ),
            max_candidates: clamp_setting(
                "IMAGE_MAX_CANDIDATES",
                env_usize("IMAGE_MAX_CANDIDATES", defaults.max_candidates),
                1,
                5,
                warnings,
            ),
            fallback_query: env_string("IMAGE_FALLBACK_QUERY", &defaults.fallback_query),
            default_image_url: env_string("DEFAULT_IMAGE_URL", &defaults.default_image_url),
            fallback_pool,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut warnings = Vec::new();
        let text = TextSettings::from_env()?;
        let image = ImageSettings::from_env(&mut warnings);

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            initial_credentials: Credentials::new(
                env_string("OPENAI_API_KEY", ""),
                env_string("UNSPLASH_ACCESS_KEY", ""),
            ),
            openai_base_url: validate_http_url(
                "OPENAI_BASE_URL",
                env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            )?,
            unsplash_search_endpoint: validate_http_url(
                "UNSPLASH_SEARCH_ENDPOINT",
                env_string(
                    "UNSPLASH_SEARCH_ENDPOINT",
                    "https://api.unsplash.com/search/photos",
                ),
            )?,
            http_timeout: Duration::from_secs(env_u64("HTTP_TIMEOUT_SECONDS", 30).max(1)),
            text,
            image,
            warnings,
        })
    }
}

pub fn render_prompt(template: &str, term: &str) -> String {
    template.replace("{term}", term.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_count_as_missing() {
        let credentials = Credentials::new("   ", "");
        assert_eq!(credentials.text_key(), None);
        assert_eq!(credentials.image_key(), None);

        let credentials = Credentials::new(" sk-test ", "img");
        assert_eq!(credentials.text_key(), Some("sk-test"));
        assert_eq!(credentials.image_key(), Some("img"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::new("sk-secret", ""));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[redacted]"));
        assert!(rendered.contains("<unset>"));
    }

    #[test]
    fn csv_skips_empty_entries() {
        assert_eq!(parse_csv(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn only_http_urls_are_accepted() {
        assert!(validate_http_url("X", "https://api.openai.com/v1".to_string()).is_ok());
        assert!(validate_http_url("X", "ftp://example.com".to_string()).is_err());
        assert!(validate_http_url("X", "not a url".to_string()).is_err());
    }

    #[test]
    fn prompt_embeds_trimmed_term() {
        assert_eq!(
            render_prompt(TREND_USER_PROMPT, "  Y2K "),
            "Explain the meaning and characteristics of this fashion term or trend: Y2K"
        );
        assert!(render_prompt(TERM_USER_PROMPT, "Gucci").contains("\"related_terms\""));
    }

    #[test]
    fn retry_defaults_apply_when_unset() {
        for name in ["TEXT_MAX_ATTEMPTS", "TREND_RETRY_DELAY_MS", "TERM_RETRY_DELAY_MS", "OPENAI_MODEL"] {
            env::remove_var(name);
        }

        let settings = TextSettings::from_env().unwrap();

        assert_eq!(settings.trend_retry.max_attempts, 3);
        assert_eq!(settings.term_retry.max_attempts, 3);
        assert_eq!(settings.trend_retry.backoff, Duration::from_secs(1));
        assert_eq!(settings.term_retry.backoff, Duration::ZERO);
    }

    #[test]
    fn zero_image_count_is_clamped_with_a_warning() {
        env::set_var("IMAGE_DEFAULT_COUNT", "0");
        let mut warnings = Vec::new();

        let settings = ImageSettings::from_env(&mut warnings);
        env::remove_var("IMAGE_DEFAULT_COUNT");

        assert_eq!(settings.default_count, 1);
        assert!(warnings
            .iter()
            .any(|warning| warning.starts_with("IMAGE_DEFAULT_COUNT=0")));
    }

    #[test]
    fn clamp_setting_only_warns_out_of_range() {
        let mut warnings = Vec::new();
        assert_eq!(clamp_setting("X", 3, 1, 5, &mut warnings), 3);
        assert!(warnings.is_empty());
        assert_eq!(clamp_setting("X", 9, 1, 5, &mut warnings), 5);
        assert_eq!(warnings, vec!["X=9 is out of range 1..=5; clamping.".to_string()]);
    }

    #[test]
    fn default_pool_has_six_entries() {
        assert_eq!(ImageSettings::default().fallback_pool.len(), 6);
    }
}
