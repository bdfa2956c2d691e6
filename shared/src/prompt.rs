//! Prompt construction for concept generation.

use crate::templates::Template;

/// System message sent ahead of every generation prompt.
pub const SYSTEM_PREFACE: &str =
    "你是一个专业的产品概念生成专家，擅长将信息转化为结构化的产品概念卡片内容。";

/// Build the user instruction for `template` given the assembled context.
///
/// The instruction names the template, lists each field's label and
/// placeholder as a content hint, and asks for a single JSON object keyed by
/// the template's field keys in order, with nothing else around it.
pub fn build_prompt(template: &Template, context: &str) -> String {
    let field_hints = template
        .fields
        .iter()
        .map(|f| match f.max_length {
            Some(max) => format!("- {}：{}（不超过{}字）", f.label, f.placeholder, max),
            None => format!("- {}：{}", f.label, f.placeholder),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let schema_lines = template
        .fields
        .iter()
        .map(|f| format!("  \"{}\": \"内容\"", f.key))
        .collect::<Vec<_>>()
        .join(",\n");
    let schema = format!("{{\n{}\n}}", schema_lines);

    let keys = template.keys().collect::<Vec<_>>().join("、");

    format!(
        "你是一个专业的产品概念生成专家。请根据以下信息生成一个{name}。

{context}

请生成以下字段内容：
{field_hints}

要求：
1. 每个字段内容简洁有力，突出重点
2. 使用专业但不晦涩的语言
3. 内容要有数据支撑，避免空洞
4. 字段内容要相互呼应，形成完整的概念

请以JSON格式返回一个对象，键必须且只能是：{keys}，按此顺序，值均为字符串。格式如下：
{schema}

只返回JSON，不要其他解释，不要使用markdown代码块。",
        name = template.name,
    )
}
