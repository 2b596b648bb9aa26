/*!
 * Shielding of inline markup tags from the model.
 *
 * Tags are swapped for numbered placeholders before prompting and swapped
 * back afterwards, so the model cannot rename, translate or drop them.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__TAG_PLACEHOLDER_(\d+)__").expect("Invalid tag placeholder regex"));

/// Text with its tags replaced by placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedText {
    /// Text sent to the model
    pub text: String,
    /// Original tags, indexed by placeholder number
    pub tags: Vec<String>,
}

impl ProtectedText {
    /// Replace every `<...>` tag in `text` with `__TAG_PLACEHOLDER_n__`
    pub fn protect(text: &str) -> Self {
        let mut tags = Vec::new();
        let protected = TAG_REGEX.replace_all(text, |caps: &Captures| {
            let placeholder = format!("__TAG_PLACEHOLDER_{}__", tags.len());
            tags.push(caps[0].to_string());
            placeholder
        });

        Self {
            text: protected.into_owned(),
            tags,
        }
    }

    /// Put the original tags back into `translated`; unknown placeholders are left alone
    pub fn restore(&self, translated: &str) -> String {
        PLACEHOLDER_REGEX
            .replace_all(translated, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.tags.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Shield another text with this mapping, e.g. a draft of the same source
    ///
    /// The n-th occurrence of a tag takes the placeholder of the n-th
    /// occurrence of that tag in the original; surplus occurrences reuse the
    /// last one. Tags the original never had are left as they are.
    pub fn shield(&self, other: &str) -> String {
        let mut seen: HashMap<String, usize> = HashMap::new();
        TAG_REGEX
            .replace_all(other, |caps: &Captures| {
                let tag = &caps[0];
                let occurrence = seen.entry(tag.to_string()).or_insert(0);
                let indices: Vec<usize> = (0..self.tags.len()).filter(|&i| self.tags[i] == tag).collect();
                let chosen = indices.get(*occurrence).or(indices.last()).copied();
                *occurrence += 1;
                match chosen {
                    Some(index) => format!("__TAG_PLACEHOLDER_{}__", index),
                    None => tag.to_string(),
                }
            })
            .into_owned()
    }

    /// Whether any tag was shielded
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }
}
