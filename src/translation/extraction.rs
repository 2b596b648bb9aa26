/*!
 * Pulling the final translation out of a model response.
 *
 * Reasoning prompts make models think out loud before answering. The answer
 * is recovered either from a JSON object (`{"translation": "..."}`) or from
 * the text after a `Translation:` marker, once thinking blocks are removed.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Thinking blocks in the tag styles models are known to emit
static THINKING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<thinking>.*?</thinking>|<think>.*?</think>|\[think\].*?\[/think\]|◁think▷.*?◁/think▷")
        .expect("Invalid thinking block regex")
});

/// Marker introducing the answer in free-form responses
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:translation|translated text)\s*:\s*").expect("Invalid translation marker regex")
});

/// Remove every thinking block and trim the rest
pub fn strip_thinking(text: &str) -> String {
    THINKING_REGEX.replace_all(text, "").trim().to_string()
}

/// Remove a surrounding ```json ... ``` or ``` ... ``` fence
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Read the `translation` string out of a JSON response
fn extract_json(response: &str) -> Option<String> {
    let value: Value = serde_json::from_str(strip_code_fence(response)).ok()?;
    value.get("translation")?.as_str().map(str::to_string)
}

/// Extract the translation from a reasoning response
///
/// # Arguments
/// * `response` - Raw model output
/// * `use_json` - Try the JSON object format first
pub fn extract_translation(response: &str, use_json: bool) -> String {
    if use_json {
        match extract_json(response) {
            Some(translation) => return translation,
            None => debug!("JSON extraction failed, falling back to text extraction"),
        }
    }

    let cleaned = strip_thinking(response);
    match MARKER_REGEX.find(&cleaned) {
        Some(marker) => cleaned[marker.end()..].trim().to_string(),
        None => cleaned,
    }
}
