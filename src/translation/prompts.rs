/*!
 * Prompt and request payload construction.
 */

use serde_json::{Map, Value, json};

use crate::app_config::ModelConfig;

/// Prefix a prompt with glossary context
pub fn with_glossary(prompt: String, glossary: Option<&str>) -> String {
    match glossary {
        Some(glossary) if !glossary.is_empty() => {
            format!("Please use this glossary for context:\n{}\n\n{}", glossary, prompt)
        }
        _ => prompt,
    }
}

/// Direct translation prompt
pub fn translation_prompt(config: &ModelConfig, text: &str, reasoning: bool, glossary: Option<&str>) -> String {
    let template = if reasoning {
        &config.reasoning_prompt_template
    } else {
        &config.prompt_template
    };
    with_glossary(template.replace("{text}", text), glossary)
}

/// Numbered, fenced list of drafts: "1. ```first```\n2. ```second```"
pub fn format_draft_list(drafts: &[String]) -> String {
    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| format!("{}. ```{}```", i + 1, draft))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Refinement prompt over a set of drafts
pub fn refine_prompt(
    config: &ModelConfig,
    original_text: &str,
    drafts: &[String],
    reasoning: bool,
    glossary: Option<&str>,
) -> String {
    let template = if reasoning {
        &config.refine_reasoning_prompt_template
    } else {
        &config.refine_prompt_template
    };
    let prompt = template
        .replace("{original_text}", original_text)
        .replace("{draft_list}", &format_draft_list(drafts));
    with_glossary(prompt, glossary)
}

/// Request body for `config.endpoint`: sampling params, then the prompt in the endpoint's shape
pub fn build_payload(model_name: &str, config: &ModelConfig, prompt: &str) -> Value {
    let mut payload = Map::new();
    payload.insert("model".to_string(), Value::String(model_name.to_string()));
    for (key, value) in &config.params {
        payload.insert(key.clone(), value.clone());
    }

    if config.is_chat() {
        let mut messages = Vec::new();
        if let Some(system) = config.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));
        payload.insert("messages".to_string(), Value::Array(messages));
    } else {
        payload.insert("prompt".to_string(), Value::String(prompt.to_string()));
    }

    Value::Object(payload)
}

/// Generated text of a completion response, trimmed; empty if the shape is unexpected
pub fn response_text(config: &ModelConfig, response: &Value) -> String {
    let choice = &response["choices"][0];
    let text = if config.is_chat() {
        choice["message"]["content"].as_str()
    } else {
        choice["text"].as_str()
    };
    text.unwrap_or_default().trim().to_string()
}
