/*!
 * The bracket/angle markup format.
 *
 * Documents are line-oriented. `[Group]`/`[/Group]` and `<element>`/`</element>`
 * open and close nested nodes, `#` starts a comment, everything else is text.
 *
 * - `node`: the tree type
 * - `parser`: text to tree
 * - `serializer`: tree to text
 * - `merge`: left-priority deep merge of two trees
 */

pub mod merge;
pub mod node;
pub mod parser;
pub mod serializer;

pub use merge::merge;
pub use node::{Node, NodePath};
pub use parser::deserialize;
pub use serializer::serialize;
