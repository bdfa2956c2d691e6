//! Turns an entry's payload into the contextual text fed to the prompt.

use indexmap::IndexSet;

use crate::error::ValidationError;
use crate::models::{EntryType, GenerateRequest, SearchHit};

/// Minimum length of pasted text, in characters.
pub const MIN_TEXT_CHARS: usize = 50;

const IMAGE_PREAMBLE: &str = "用户上传了一张图片，请根据图片内容生成相关概念。\n\n";
const FILE_PREAMBLE: &str = "用户上传了一份资料，请根据资料内容生成相关概念。\n\n";

/// Contextual text plus the distinct sources it cites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    /// Distinct source labels in first-seen order; empty for non-search entries
    pub sources: Vec<String>,
}

/// Build the context for a request, checking the entry-specific payload.
pub fn assemble(request: &GenerateRequest) -> Result<AssembledContext, ValidationError> {
    match request.entry_type {
        EntryType::Topic => {
            let topic = non_blank(request.topic.as_deref()).ok_or(ValidationError::MissingTopic)?;
            Ok(topic_context(topic, &request.selected_results))
        }
        EntryType::Text => {
            let text = request.text.as_deref().unwrap_or_default();
            let actual = text.trim().chars().count();
            if actual < MIN_TEXT_CHARS {
                return Err(ValidationError::TextTooShort {
                    min: MIN_TEXT_CHARS,
                    actual,
                });
            }
            Ok(AssembledContext {
                text: format!("用户提供的内容：\n{}\n\n", text),
                sources: Vec::new(),
            })
        }
        EntryType::Image => {
            non_blank(request.image_url.as_deref()).ok_or(ValidationError::MissingImage)?;
            Ok(AssembledContext {
                text: IMAGE_PREAMBLE.to_string(),
                sources: Vec::new(),
            })
        }
        EntryType::File => {
            non_blank(request.file_url.as_deref()).ok_or(ValidationError::MissingFile)?;
            Ok(AssembledContext {
                text: FILE_PREAMBLE.to_string(),
                sources: Vec::new(),
            })
        }
    }
}

fn topic_context(topic: &str, hits: &[SearchHit]) -> AssembledContext {
    let mut text = format!("主题：{}\n\n", topic);
    let mut sources = IndexSet::new();

    if !hits.is_empty() {
        text.push_str("参考数据：\n");
        for (index, hit) in hits.iter().enumerate() {
            text.push_str(&format!(
                "{}. {}\n   {}\n   来源：{}\n\n",
                index + 1,
                hit.title,
                hit.snippet,
                hit.source
            ));
            let source = hit.source.trim();
            if !source.is_empty() {
                sources.insert(source.to_string());
            }
        }
    }

    AssembledContext {
        text,
        sources: sources.into_iter().collect(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
