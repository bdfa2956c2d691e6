//! Shared data models.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ValidationError;

/// Field key to generated value, in template field order.
pub type GeneratedContent = IndexMap<String, String>;

/// Modality through which the user supplied source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Topic,
    Text,
    Image,
    File,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Topic => "topic",
            EntryType::Text => "text",
            EntryType::Image => "image",
            EntryType::File => "file",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "topic" => Some(EntryType::Topic),
            "text" => Some(EntryType::Text),
            "image" => Some(EntryType::Image),
            "file" => Some(EntryType::File),
            _ => None,
        }
    }
}

/// A single search result as returned by `/api/search` and echoed back in
/// `selectedResults`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
    pub source: String,
    #[serde(default)]
    pub selected: bool,
}

/// Generation request payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub entry_type: EntryType,
    pub template_id: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub selected_results: Vec<SearchHit>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
}

/// Generation response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub content: GeneratedContent,
    /// Milliseconds
    pub duration: u64,
    pub sources: Vec<String>,
}

/// Search request payload.
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(custom(function = "validate_keyword"))]
    pub keyword: String,
    #[serde(default = "default_search_limit")]
    #[validate(range(min = 1, max = 20))]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    10
}

fn validate_keyword(keyword: &str) -> Result<(), validator::ValidationError> {
    if keyword.trim().chars().count() < 2 {
        return Err(validator::ValidationError::new("keyword_too_short"));
    }
    Ok(())
}

impl SearchRequest {
    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate().map_err(|errors| {
            if errors.field_errors().contains_key("keyword") {
                ValidationError::InvalidKeyword
            } else {
                ValidationError::InvalidField(format!("limit must be between 1 and 20: {}", errors))
            }
        })
    }
}

/// Search response payload.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

/// Visual style for generated illustrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    #[default]
    Minimal,
    Tech,
    Warm,
    Business,
}

impl ImageStyle {
    pub fn prompt_phrase(&self) -> &'static str {
        match self {
            ImageStyle::Minimal => "minimalist style, clean design, simple shapes, white space",
            ImageStyle::Tech => {
                "futuristic technology style, digital art, neon accents, dark background"
            }
            ImageStyle::Warm => {
                "warm and friendly style, soft colors, organic shapes, inviting atmosphere"
            }
            ImageStyle::Business => {
                "professional business style, corporate design, clean lines, blue tones"
            }
        }
    }
}

/// Image generation request payload.
#[derive(Debug, Deserialize, Validate)]
pub struct ImageRequest {
    #[validate(custom(function = "validate_image_prompt"))]
    pub prompt: String,
    #[serde(default)]
    pub style: ImageStyle,
}

fn validate_image_prompt(prompt: &str) -> Result<(), validator::ValidationError> {
    if prompt.trim().chars().count() < 5 {
        return Err(validator::ValidationError::new("prompt_too_short"));
    }
    Ok(())
}

impl ImageRequest {
    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate().map_err(|_| ValidationError::InvalidPrompt)
    }
}

/// Image generation response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
    /// Milliseconds
    pub duration: u64,
    pub fallback: bool,
}

/// Output format a card is laid out for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSpec {
    #[default]
    Xiaohongshu,
    Moments,
    Wechat,
    Poster,
}

impl CardSpec {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSpec::Xiaohongshu => "xiaohongshu",
            CardSpec::Moments => "moments",
            CardSpec::Wechat => "wechat",
            CardSpec::Poster => "poster",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "xiaohongshu" => Some(CardSpec::Xiaohongshu),
            "moments" => Some(CardSpec::Moments),
            "wechat" => Some(CardSpec::Wechat),
            "poster" => Some(CardSpec::Poster),
            _ => None,
        }
    }
}

/// A saved generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub topic: String,
    pub entry_type: EntryType,
    pub template_id: String,
    pub template_name: String,
    pub content: GeneratedContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub card_spec: CardSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// History save payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryRecord {
    #[serde(default)]
    pub topic: String,
    pub entry_type: EntryType,
    pub template_id: String,
    pub template_name: Option<String>,
    pub content: GeneratedContent,
    pub image_url: Option<String>,
    #[serde(default)]
    pub card_spec: CardSpec,
    pub thumbnail: Option<String>,
}

/// One page of history, newest first.
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_request() {
        let json = r#"{
            "entryType": "topic",
            "templateId": "product-concept",
            "topic": "AI工具",
            "selectedResults": [{"title": "t", "snippet": "s", "source": "zhihu.com"}]
        }"#;
        let request: GenerateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.entry_type, EntryType::Topic);
        assert_eq!(request.template_id.as_deref(), Some("product-concept"));
        assert_eq!(request.selected_results[0].source, "zhihu.com");
        assert!(request.text.is_none());
    }

    #[test]
    fn test_unknown_entry_type_rejected() {
        let json = r#"{"entryType": "video", "templateId": "product-concept"}"#;
        assert!(serde_json::from_str::<GenerateRequest>(json).is_err());
    }

    #[test]
    fn test_search_request_validation() {
        let ok: SearchRequest = serde_json::from_str(r#"{"keyword": "宠物"}"#).unwrap();
        assert_eq!(ok.limit, 10);
        assert!(ok.check().is_ok());

        let short: SearchRequest = serde_json::from_str(r#"{"keyword": " a "}"#).unwrap();
        assert_eq!(short.check(), Err(ValidationError::InvalidKeyword));

        let too_many: SearchRequest =
            serde_json::from_str(r#"{"keyword": "AI工具", "limit": 50}"#).unwrap();
        assert!(matches!(too_many.check(), Err(ValidationError::InvalidField(_))));
    }

    #[test]
    fn test_image_request_defaults_to_minimal() {
        let request: ImageRequest =
            serde_json::from_str(r#"{"prompt": "a cat robot"}"#).unwrap();
        assert_eq!(request.style, ImageStyle::Minimal);
        assert!(request.check().is_ok());

        let short: ImageRequest = serde_json::from_str(r#"{"prompt": "cat "}"#).unwrap();
        assert_eq!(short.check(), Err(ValidationError::InvalidPrompt));
    }

    #[test]
    fn test_generate_response_shape() {
        let mut content = GeneratedContent::new();
        content.insert("name".into(), "FocusPet".into());
        let body = serde_json::to_value(GenerateResponse {
            content,
            duration: 12,
            sources: vec!["zhihu.com".into()],
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"content": {"name": "FocusPet"}, "duration": 12, "sources": ["zhihu.com"]})
        );
    }
}
