/*!
 * In-memory tree for the bracket/angle markup format.
 *
 * A `Node` owns its literal text, the comments attached to it, and its child
 * tags keyed by name in first-encountered order. The serde representation
 * mirrors the flat mapping shape (`#text`, `#comments`, then one key per
 * child), which is what the JSON dump and the test fixtures use.
 */

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key under which a node's text appears in the mapping representation
pub const TEXT_KEY: &str = "#text";

/// Key under which a node's comments appear in the mapping representation
pub const COMMENTS_KEY: &str = "#comments";

/// A parsed tag (or the document root)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Dedented literal text content
    #[serde(rename = "#text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Comments attached to this node, in source order
    #[serde(rename = "#comments", default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,

    /// Child tags keyed by name; iteration order is serialization order
    #[serde(flatten)]
    pub children: IndexMap<String, Node>,
}

/// Location of a node as the sequence of child names from the root
pub type NodePath = Vec<String>;

impl Node {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node holding only text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Builder-style child insertion
    pub fn with_child(mut self, name: impl Into<String>, child: Node) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    /// Builder-style comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Look up a direct child
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Look up a direct child mutably
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    /// Register a child, replacing an earlier sibling of the same name in place
    pub fn insert_child(&mut self, name: impl Into<String>, child: Node) {
        self.children.insert(name.into(), child);
    }

    /// Append a block of text, newline-separated from any existing text.
    /// Empty blocks are ignored.
    pub fn append_text(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        match &mut self.text {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(content);
            }
            None => self.text = Some(content.to_string()),
        }
    }

    /// True if the node has neither text nor children (comments don't count)
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.children.is_empty()
    }

    /// Resolve a path relative to this node
    pub fn node_at(&self, path: &[String]) -> Option<&Node> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Resolve a path relative to this node, mutably
    pub fn node_at_mut(&mut self, path: &[String]) -> Option<&mut Node> {
        path.iter().try_fold(self, |node, name| node.child_mut(name))
    }

    /// Visit every node (self first, then children in order) with its path
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&[String], &'a Node)) {
        let mut path = Vec::new();
        self.walk_inner(&mut path, visit);
    }

    fn walk_inner<'a>(&'a self, path: &mut NodePath, visit: &mut dyn FnMut(&[String], &'a Node)) {
        visit(path, self);
        for (name, child) in &self.children {
            path.push(name.clone());
            child.walk_inner(path, visit);
            path.pop();
        }
    }

    /// Apply `f` to every node in pre-order
    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in self.children.values_mut() {
            child.for_each_mut(f);
        }
    }

    /// Total number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}
