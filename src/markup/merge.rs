/*!
 * Left-priority deep merge of two markup trees.
 */

use super::node::Node;

/// Merge `secondary` into a copy of `primary`.
///
/// Children present on both sides are merged recursively. Text and comments
/// are taken from `primary` whenever it has them; `secondary` only fills gaps.
/// Neither input is modified.
pub fn merge(primary: &Node, secondary: &Node) -> Node {
    let mut merged = primary.clone();

    if merged.text.is_none() {
        merged.text = secondary.text.clone();
    }
    if merged.comments.is_empty() {
        merged.comments = secondary.comments.clone();
    }

    for (name, theirs) in &secondary.children {
        match merged.children.get_mut(name) {
            Some(ours) => *ours = merge(ours, theirs),
            None => {
                merged.children.insert(name.clone(), theirs.clone());
            }
        }
    }

    merged
}
