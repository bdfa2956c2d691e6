//! Built-in concept card templates.
//!
//! A template's field order is the only contract with the model's output
//! schema: prompts list fields in this order and fallback content is built
//! from it.

use std::sync::OnceLock;

use crate::models::GeneratedContent;

/// One named slot in a template.
#[derive(Debug, Clone)]
pub struct Field {
    pub key: String,
    pub label: String,
    /// Prompt hint, and the fallback value when generation degrades
    pub placeholder: String,
    /// Suggested length in characters, passed to the model as a hint
    pub max_length: Option<usize>,
}

impl Field {
    pub fn new(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            placeholder: placeholder.to_string(),
            max_length: None,
        }
    }

    fn max(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Immutable card template definition.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub fields: Vec<Field>,
}

impl Template {
    pub fn new(id: &str, name: &str, fields: Vec<Field>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            fields,
        }
    }

    /// Field keys in template order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Content mapping every field key to its placeholder.
    pub fn placeholder_content(&self) -> GeneratedContent {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.placeholder.clone()))
            .collect()
    }
}

/// Read-only template catalog.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

static BUILTIN: OnceLock<TemplateRegistry> = OnceLock::new();

impl TemplateRegistry {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// The compiled-in catalog, shared by every request.
    pub fn builtin() -> &'static TemplateRegistry {
        BUILTIN.get_or_init(|| Self::new(builtin_templates()))
    }

    pub fn find(&self, template_id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == template_id)
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }
}

fn builtin_templates() -> Vec<Template> {
    vec![
        Template::new(
            "product-concept",
            "产品概念卡",
            vec![
                Field::new("name", "产品名称", "请输入产品名称").max(20),
                Field::new("tagline", "一句话介绍", "用一句话描述产品价值").max(50),
                Field::new("targetUser", "目标用户", "描述目标用户群体").max(100),
                Field::new("features", "核心功能", "列出3-5个核心功能").max(200),
                Field::new("differentiation", "差异化优势", "与竞品相比的优势").max(150),
            ],
        ),
        Template::new(
            "marketing-creative",
            "营销创意卡",
            vec![
                Field::new("theme", "活动主题", "请输入活动主题").max(30),
                Field::new("painPoint", "用户痛点", "描述用户面临的问题").max(100),
                Field::new("solution", "解决方案", "你的产品如何解决").max(150),
                Field::new("cta", "行动号召", "希望用户做什么").max(50),
                Field::new("highlights", "卖点提炼", "3个核心卖点").max(100),
            ],
        ),
        Template::new(
            "brand-story",
            "品牌故事卡",
            vec![
                Field::new("philosophy", "品牌理念", "品牌的核心价值观").max(100),
                Field::new("story", "创始故事", "品牌诞生的故事").max(200),
                Field::new("values", "品牌价值观", "3个核心价值").max(100),
                Field::new("vision", "品牌愿景", "未来的目标").max(100),
            ],
        ),
        Template::new(
            "feature-intro",
            "功能介绍卡",
            vec![
                Field::new("featureName", "功能名称", "请输入功能名称").max(20),
                Field::new("problem", "解决问题", "该功能解决什么问题").max(100),
                Field::new("usage", "使用方法", "用户如何使用").max(150),
                Field::new("value", "用户价值", "用户能获得什么").max(100),
            ],
        ),
        Template::new(
            "comparison-review",
            "对比评测卡",
            vec![
                Field::new("products", "对比产品", "列出对比的产品").max(100),
                Field::new("pros", "优势分析", "各产品的优势").max(150),
                Field::new("cons", "劣势分析", "各产品的劣势").max(150),
                Field::new("recommendation", "推荐建议", "你的推荐和理由").max(100),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_lookup() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.all().len(), 5);

        let product = registry.find("product-concept").unwrap();
        assert_eq!(product.name, "产品概念卡");
        assert_eq!(
            product.keys().collect::<Vec<_>>(),
            vec!["name", "tagline", "targetUser", "features", "differentiation"]
        );
        assert!(registry.find("missing").is_none());
    }

    #[test]
    fn test_field_keys_unique_per_template() {
        for template in TemplateRegistry::builtin().all() {
            assert!(!template.fields.is_empty(), "{} has no fields", template.id);
            let keys: HashSet<_> = template.keys().collect();
            assert_eq!(keys.len(), template.fields.len(), "{} repeats a key", template.id);
        }
    }

    #[test]
    fn test_placeholder_content_preserves_order() {
        let template = TemplateRegistry::builtin().find("brand-story").unwrap();
        let content = template.placeholder_content();
        let keys: Vec<_> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["philosophy", "story", "values", "vision"]);
        assert_eq!(content["vision"], "未来的目标");
    }
}
