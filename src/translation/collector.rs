/*!
 * Selection of the nodes that still need translating.
 */

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::language_utils::{LanguageDetector, is_english};
use crate::markup::{Node, NodePath};

/// Prefix marking a node's text as already translated
pub const PROCESSED_MARKER: &str = "jp_text:::";

/// Text that is nothing but a `%variable%` reference
static VARIABLE_ONLY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%+\w+%*$").expect("Invalid variable-only regex"));

/// Whether `text` should be sent for translation
pub fn needs_translation(text: &str, detector: &dyn LanguageDetector) -> bool {
    if text.trim().is_empty() || VARIABLE_ONLY_REGEX.is_match(text) || text.starts_with(PROCESSED_MARKER) {
        return false;
    }

    match detector.detect(text) {
        Ok(code) => !is_english(&code),
        Err(e) => {
            trace!("{}; collecting anyway", e);
            true
        }
    }
}

/// Paths of every node whose text needs translation, in pre-order
pub fn collect_text_nodes(tree: &Node, detector: &dyn LanguageDetector) -> Vec<NodePath> {
    let mut paths = Vec::new();
    tree.walk(&mut |path, node| {
        if let Some(text) = &node.text {
            if needs_translation(text, detector) {
                paths.push(path.to_vec());
            }
        }
    });
    paths
}

/// Strip the processed marker from every text in the tree
pub fn cleanup_markers(tree: &mut Node) {
    tree.for_each_mut(&mut |node| {
        if let Some(text) = node.text.as_mut() {
            if let Some(rest) = text.strip_prefix(PROCESSED_MARKER) {
                *text = rest.to_string();
            }
        }
    });
}
