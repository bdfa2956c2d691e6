//! Configuration management for Lambda functions.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the OpenAI-compatible API (chat + images)
    pub openai_api_base: String,
    /// Inline API key for the OpenAI-compatible API
    pub openai_api_key: Option<String>,
    /// ARN of the secret holding the OpenAI API key
    pub openai_api_key_secret_arn: Option<String>,
    /// Chat model
    pub openai_model: String,
    /// Image model
    pub openai_image_model: String,
    /// Tavily search endpoint
    pub tavily_api_url: String,
    /// Inline Tavily API key
    pub tavily_api_key: Option<String>,
    /// ARN of the secret holding the Tavily API key
    pub tavily_api_key_secret_arn: Option<String>,
    /// Upper bound on a single generation call
    pub generation_timeout: Duration,
    /// Maximum number of retained history records
    pub history_capacity: usize,
    /// Postgres connection string for durable history
    pub database_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            openai_api_key: None,
            openai_api_key_secret_arn: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_image_model: "dall-e-3".to_string(),
            tavily_api_url: DEFAULT_TAVILY_API_URL.to_string(),
            tavily_api_key: None,
            tavily_api_key_secret_arn: None,
            generation_timeout: Duration::from_secs(30),
            history_capacity: 100,
            database_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            openai_api_base: env::var("OPENAI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_api_base),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_api_key_secret_arn: non_empty_var("OPENAI_API_KEY_SECRET_ARN"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_image_model: env::var("OPENAI_IMAGE_MODEL")
                .unwrap_or(defaults.openai_image_model),
            tavily_api_url: env::var("TAVILY_API_URL").unwrap_or(defaults.tavily_api_url),
            tavily_api_key: non_empty_var("TAVILY_API_KEY"),
            tavily_api_key_secret_arn: non_empty_var("TAVILY_API_KEY_SECRET_ARN"),
            generation_timeout: parse_var("GENERATION_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.generation_timeout),
            history_capacity: parse_var("HISTORY_CAPACITY")?.unwrap_or(defaults.history_capacity),
            database_url: non_empty_var("DATABASE_URL"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} is not a valid number: {}", name, raw))),
        None => Ok(None),
    }
}
