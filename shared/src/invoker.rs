//! Calls the text-generation service and recovers structured field values.
//!
//! Generation never fails from the caller's point of view: transport errors,
//! timeouts, and unusable model output all resolve to the template's
//! placeholder content. The reason is kept on the outcome for logging.

use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::TextGenerator;
use crate::models::GeneratedContent;
use crate::prompt::SYSTEM_PREFACE;
use crate::templates::Template;

/// Why a generation fell back to placeholder content.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DegradeReason {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("JSON value is not an object")]
    NotAnObject,

    #[error("missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("value for {0} is not a string")]
    NonStringValue(String),
}

/// Result of one generation attempt.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Always holds exactly the template's field keys
    pub content: GeneratedContent,
    pub elapsed: Duration,
    /// Set when `content` is the placeholder fallback
    pub degraded: Option<DegradeReason>,
}

/// Single-attempt generation with a time bound.
pub struct GenerationInvoker<G> {
    generator: G,
    timeout: Duration,
}

impl<G: TextGenerator> GenerationInvoker<G> {
    pub fn new(generator: G, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn invoke(&self, prompt: &str, template: &Template) -> GenerationOutcome {
        let started = Instant::now();

        let recovered = match tokio::time::timeout(
            self.timeout,
            self.generator.complete(SYSTEM_PREFACE, prompt),
        )
        .await
        {
            Err(_) => Err(DegradeReason::Timeout(self.timeout)),
            Ok(Err(e)) => Err(DegradeReason::Transport(e.to_string())),
            Ok(Ok(raw)) => recover_content(&raw, template),
        };

        let elapsed = started.elapsed();

        match recovered {
            Ok(content) => {
                info!(
                    template_id = %template.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generation succeeded"
                );
                GenerationOutcome {
                    content,
                    elapsed,
                    degraded: None,
                }
            }
            Err(reason) => {
                warn!(
                    template_id = %template.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    reason = %reason,
                    "Generation degraded, using placeholder content"
                );
                GenerationOutcome {
                    content: template.placeholder_content(),
                    elapsed,
                    degraded: Some(reason),
                }
            }
        }
    }
}

/// Recover the template's fields from raw model output.
///
/// Either every field key is present with a string value, or the whole parse
/// is discarded. Keys the template does not define are dropped.
pub fn recover_content(raw: &str, template: &Template) -> Result<GeneratedContent, DegradeReason> {
    if raw.trim().is_empty() {
        return Err(DegradeReason::EmptyResponse);
    }

    let span = extract_json_object(raw).ok_or(DegradeReason::NoJsonObject)?;
    let parsed: Value =
        serde_json::from_str(span).map_err(|e| DegradeReason::InvalidJson(e.to_string()))?;
    let object = parsed.as_object().ok_or(DegradeReason::NotAnObject)?;

    let missing: Vec<String> = template
        .keys()
        .filter(|key| !object.contains_key(*key))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(DegradeReason::MissingKeys(missing));
    }

    let mut content = GeneratedContent::with_capacity(template.fields.len());
    for key in template.keys() {
        let value = object
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| DegradeReason::NonStringValue(key.to_string()))?;
        content.insert(key.to_string(), value.to_string());
    }

    Ok(content)
}

/// Locate the first balanced `{...}` span in `text`.
///
/// Scans from the first `{`, tracking nesting depth and skipping braces inside
/// JSON string literals, and stops where the depth returns to zero. Returns
/// `None` when there is no `{` or the first object never closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRegistry;
    use crate::{Error, Result};
    use async_trait::async_trait;

    fn product() -> &'static Template {
        TemplateRegistry::builtin().find("product-concept").unwrap()
    }

    const FULL: &str = r#"{"name":"FocusPet","tagline":"陪你专注的电子宠物","targetUser":"远程办公人群","features":"番茄钟、成长系统、专注统计","differentiation":"情感陪伴驱动专注"}"#;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(Error::Upstream("chat completion failed: 503".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(FULL.to_string())
        }
    }

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object(FULL), Some(FULL));
    }

    #[test]
    fn test_extract_from_surrounding_prose() {
        let raw = format!("好的，以下是结果：\n```json\n{}\n```\n希望有帮助！", FULL);
        assert_eq!(extract_json_object(&raw), Some(FULL));
    }

    #[test]
    fn test_extract_stops_at_first_closure() {
        let raw = r#"{"a":"1"} and later {"b":"2"}"#;
        assert_eq!(extract_json_object(raw), Some(r#"{"a":"1"}"#));
    }

    #[test]
    fn test_extract_handles_nesting_and_string_braces() {
        let raw = r#"x {"a":{"b":"}"},"c":"\"{"} y }"#;
        assert_eq!(extract_json_object(raw), Some(r#"{"a":{"b":"}"},"c":"\"{"}"#));
    }

    #[test]
    fn test_extract_unbalanced_or_absent() {
        assert_eq!(extract_json_object("no braces here"), None);
        assert_eq!(extract_json_object(r#"{"name":"FocusPet""#), None);
    }

    #[test]
    fn test_recover_well_formed_unchanged() {
        let content = recover_content(FULL, product()).unwrap();
        let expected: GeneratedContent = serde_json::from_str(FULL).unwrap();
        assert_eq!(content, expected);
    }

    #[test]
    fn test_recover_uses_template_order_and_drops_extras() {
        let raw = r#"{"differentiation":"d","features":"f","targetUser":"u","tagline":"t","name":"n","extra":"x"}"#;
        let content = recover_content(raw, product()).unwrap();
        let keys: Vec<_> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "tagline", "targetUser", "features", "differentiation"]);
    }

    #[test]
    fn test_recover_rejects_partial_object() {
        let raw = r#"{"name":"FocusPet","tagline":"t"}"#;
        assert_eq!(
            recover_content(raw, product()),
            Err(DegradeReason::MissingKeys(vec![
                "targetUser".to_string(),
                "features".to_string(),
                "differentiation".to_string(),
            ]))
        );
    }

    #[test]
    fn test_recover_rejects_malformed() {
        assert_eq!(recover_content("", product()), Err(DegradeReason::EmptyResponse));
        assert_eq!(recover_content("抱歉，无法生成", product()), Err(DegradeReason::NoJsonObject));
        assert!(matches!(
            recover_content("{name: FocusPet}", product()),
            Err(DegradeReason::InvalidJson(_))
        ));
        let raw = r#"{"name":"n","tagline":"t","targetUser":"u","features":["a","b"],"differentiation":"d"}"#;
        assert_eq!(
            recover_content(raw, product()),
            Err(DegradeReason::NonStringValue("features".to_string()))
        );
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let invoker = GenerationInvoker::new(Canned(FULL), Duration::from_secs(1));
        let outcome = invoker.invoke("prompt", product()).await;
        assert!(outcome.degraded.is_none());
        assert_eq!(outcome.content["name"], "FocusPet");
    }

    #[tokio::test]
    async fn test_invoke_failure_falls_back_for_every_template() {
        let invoker = GenerationInvoker::new(Failing, Duration::from_secs(1));
        for template in TemplateRegistry::builtin().all() {
            let outcome = invoker.invoke("prompt", template).await;
            assert_eq!(outcome.content, template.placeholder_content());
            assert!(matches!(outcome.degraded, Some(DegradeReason::Transport(_))));
        }
    }

    #[tokio::test]
    async fn test_invoke_malformed_falls_back() {
        let invoker = GenerationInvoker::new(Canned(r#"{"name":"only"}"#), Duration::from_secs(1));
        let outcome = invoker.invoke("prompt", product()).await;
        assert_eq!(outcome.content, product().placeholder_content());
        assert!(matches!(outcome.degraded, Some(DegradeReason::MissingKeys(_))));
    }

    #[tokio::test]
    async fn test_invoke_timeout_falls_back() {
        let invoker = GenerationInvoker::new(Slow, Duration::from_millis(20));
        let outcome = invoker.invoke("prompt", product()).await;
        assert_eq!(outcome.content, product().placeholder_content());
        assert_eq!(
            outcome.degraded,
            Some(DegradeReason::Timeout(Duration::from_millis(20)))
        );
    }
}
