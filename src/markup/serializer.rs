/*!
 * Serializer for the bracket/angle markup format.
 *
 * Tag syntax is derived from depth alone: direct children of the root are
 * written as `[Group]` blocks, everything below as `<element>` tags. Nested
 * content is indented with one tab per level. Root comments are written first
 * so file-header comments stay at the top.
 */

use super::node::Node;

/// Serialize a tree back into markup text
pub fn serialize(root: &Node) -> String {
    let mut lines: Vec<String> = Vec::new();

    if !root.comments.is_empty() {
        lines.extend(root.comments.iter().map(|comment| format!("# {}", comment)));
        if !root.children.is_empty() {
            lines.push(String::new());
        }
    }

    for (name, child) in &root.children {
        lines.extend(child.comments.iter().map(|comment| format!("# {}", comment)));
        lines.push(format!("[{}]", name));
        let content = serialize_content(child, 1);
        if !content.is_empty() {
            lines.push(content);
        }
        lines.push(format!("[/{}]", name));
    }

    lines.join("\n")
}

/// Serialize the text and children of `node` at the given indentation level
fn serialize_content(node: &Node, level: usize) -> String {
    let indent = "\t".repeat(level);
    let mut lines: Vec<String> = Vec::new();

    if let Some(text) = &node.text {
        lines.extend(text.split('\n').map(|line| format!("{}{}", indent, line)));
    }

    for (name, child) in &node.children {
        lines.extend(
            child
                .comments
                .iter()
                .map(|comment| format!("{}# {}", indent, comment)),
        );
        lines.push(format!("{}<{}>", indent, name));
        let content = serialize_content(child, level + 1);
        if !content.is_empty() {
            lines.push(content);
        }
        lines.push(format!("{}</{}>", indent, name));
    }

    lines.join("\n")
}
