//! AWS Secrets Manager integration for third-party API keys.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// JSON shape accepted for API-key secrets, e.g. `{"api_key":"sk-..."}`.
#[derive(Debug, Deserialize)]
struct ApiKeySecret {
    #[serde(alias = "apiKey", alias = "key")]
    api_key: String,
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    // Check cache first
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

/// Resolve an API key, preferring the inline value over a Secrets Manager ARN.
///
/// Returns `Ok(None)` when neither is configured so callers can decide whether
/// a missing key is fatal.
pub async fn resolve_api_key(
    inline: Option<&str>,
    secret_arn: Option<&str>,
) -> Result<Option<String>> {
    if let Some(key) = inline {
        return Ok(Some(key.to_string()));
    }
    let Some(secret_arn) = secret_arn else {
        return Ok(None);
    };

    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = SecretsClient::new(&config);
    let raw = get_secret(&client, secret_arn).await?;

    Ok(Some(parse_api_key(&raw)))
}

/// Secrets may be stored either as a bare string or as a JSON document.
fn parse_api_key(raw: &str) -> String {
    serde_json::from_str::<ApiKeySecret>(raw)
        .map(|secret| secret.api_key)
        .unwrap_or_else(|_| raw.trim().to_string())
}

/// Collapse a failed key lookup into "no key configured".
///
/// For Lambdas that degrade without a key, a Secrets Manager outage must not
/// fail initialisation; requests then run keyless and fall back.
pub fn key_or_none(resolved: Result<Option<String>>, service: &str) -> Option<String> {
    match resolved {
        Ok(key) => key,
        Err(e) => {
            warn!(service, error = %e, "API key resolution failed, continuing without a key");
            None
        }
    }
}
