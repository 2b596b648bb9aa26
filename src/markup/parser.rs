/*!
 * Line-oriented parser for the bracket/angle markup format.
 *
 * The parser walks the input one physical line at a time. Each line is either
 * a tag (`[Group]`, `[/Group]`, `<element>`, `</element>`), a comment-only
 * line, a blank line, or literal text. Text lines are buffered and flushed,
 * dedented, into whichever node is open when the next tag arrives. Comments
 * are buffered and attached to the next opened node, or to the enclosing node
 * when a blank line or closing tag intervenes.
 */

use log::trace;

use crate::errors::ParseError;

use super::node::Node;

/// Delimiter family of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `[Name]` ... `[/Name]`
    Group,
    /// `<Name>` ... `</Name>`
    Element,
}

impl TagKind {
    /// Opening delimiter character
    pub fn delimiter(self) -> char {
        match self {
            Self::Group => '[',
            Self::Element => '<',
        }
    }

    fn accepts_name(self, name: &str) -> bool {
        let forbidden: &[char] = match self {
            Self::Group => &['[', ']', ' '],
            Self::Element => &['<', '>', ' '],
        };
        !name.contains(forbidden)
    }
}

/// What a trimmed code part turned out to be
#[derive(Debug, PartialEq, Eq)]
enum TagLine<'a> {
    Open(TagKind, &'a str),
    Close(TagKind, &'a str),
}

/// Classify a trimmed line. Shapes are tried in a fixed order and the first
/// shape whose delimiters match decides; a bad name then makes it text.
fn classify(code: &str) -> Option<TagLine<'_>> {
    let (closing, kind, name) = if code.starts_with("</") && code.ends_with('>') {
        (true, TagKind::Element, &code[2..code.len() - 1])
    } else if code.starts_with("[/") && code.ends_with(']') {
        (true, TagKind::Group, &code[2..code.len() - 1])
    } else if code.starts_with('<') && code.ends_with('>') {
        (false, TagKind::Element, &code[1..code.len() - 1])
    } else if code.starts_with('[') && code.ends_with(']') {
        (false, TagKind::Group, &code[1..code.len() - 1])
    } else {
        return None;
    };

    if !kind.accepts_name(name) {
        return None;
    }
    Some(if closing {
        TagLine::Close(kind, name)
    } else {
        TagLine::Open(kind, name)
    })
}

/// Remove the common leading whitespace of the non-blank lines and join.
/// If every line is blank they are joined untouched.
pub fn dedent(lines: &[String]) -> String {
    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min();

    match min_indent {
        None => lines.join("\n"),
        Some(indent) => lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    line.as_str()
                } else {
                    skip_chars(line, indent)
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((offset, _)) => &line[offset..],
        None => "",
    }
}

/// A tag that has been opened and not yet closed
#[derive(Debug)]
struct OpenTag {
    kind: TagKind,
    name: String,
    node: Node,
}

/// Stateful parser; one instance per document
#[derive(Debug, Default)]
pub struct Parser {
    root: Node,
    open_tags: Vec<OpenTag>,
    text_buffer: Vec<String>,
    comment_buffer: Vec<String>,
    line_num: usize,
}

impl Parser {
    /// Create a parser with an empty root
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole document
    pub fn parse(mut self, text: &str) -> Result<Node, ParseError> {
        for line in text.lines() {
            self.process_line(line)?;
        }
        self.finish()
    }

    fn current_mut(&mut self) -> &mut Node {
        match self.open_tags.last_mut() {
            Some(open) => &mut open.node,
            None => &mut self.root,
        }
    }

    fn flush_text(&mut self) {
        if self.text_buffer.is_empty() {
            return;
        }
        let content = dedent(&self.text_buffer);
        self.text_buffer.clear();
        self.current_mut().append_text(&content);
    }

    fn flush_comments_into_current(&mut self) {
        if self.comment_buffer.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.comment_buffer);
        self.current_mut().comments.extend(pending);
    }

    /// Feed one physical line
    pub fn process_line(&mut self, line: &str) -> Result<(), ParseError> {
        self.line_num += 1;

        let (code, comment) = match line.split_once('#') {
            Some((code, comment)) => {
                let comment = comment.trim();
                (code, (!comment.is_empty()).then(|| comment.to_string()))
            }
            None => (line, None),
        };
        let code = code.trim();

        if code.is_empty() {
            match comment {
                // Comment lines don't count as blank text lines, otherwise a
                // commented child after text would grow the text on reparse.
                Some(comment) => self.comment_buffer.push(comment),
                None => {
                    self.flush_comments_into_current();
                    if !self.text_buffer.is_empty() {
                        self.text_buffer.push(String::new());
                    }
                }
            }
            return Ok(());
        }

        match classify(code) {
            Some(TagLine::Open(kind, name)) => {
                self.open_tag(kind, name, comment);
                Ok(())
            }
            Some(TagLine::Close(kind, name)) => self.close_tag(kind, name, comment, code),
            None => {
                self.text_buffer.push(line.to_string());
                Ok(())
            }
        }
    }

    fn open_tag(&mut self, kind: TagKind, name: &str, inline_comment: Option<String>) {
        self.flush_text();

        let mut comments = std::mem::take(&mut self.comment_buffer);
        comments.extend(inline_comment);

        trace!("line {}: open {}{}", self.line_num, kind.delimiter(), name);
        self.open_tags.push(OpenTag {
            kind,
            name: name.to_string(),
            node: Node {
                comments,
                ..Node::default()
            },
        });
    }

    fn close_tag(
        &mut self,
        kind: TagKind,
        name: &str,
        inline_comment: Option<String>,
        raw: &str,
    ) -> Result<(), ParseError> {
        self.flush_text();
        self.flush_comments_into_current();

        let matches = self
            .open_tags
            .last()
            .is_some_and(|open| open.kind == kind && open.name == name);
        if !matches {
            return Err(ParseError::MismatchedTag {
                raw: raw.to_string(),
                line: self.line_num,
            });
        }

        if let Some(closed) = self.open_tags.pop() {
            trace!("line {}: close {}{}", self.line_num, kind.delimiter(), name);
            self.current_mut().insert_child(closed.name, closed.node);
        }

        self.comment_buffer.extend(inline_comment);
        Ok(())
    }

    /// Flush buffers and check that every tag was closed
    pub fn finish(mut self) -> Result<Node, ParseError> {
        self.flush_text();

        if !self.comment_buffer.is_empty() {
            let pending = std::mem::take(&mut self.comment_buffer);
            self.root.comments.extend(pending);
        }

        if !self.open_tags.is_empty() {
            return Err(ParseError::UnclosedTags {
                stack: self
                    .open_tags
                    .iter()
                    .map(|open| (open.kind.delimiter(), open.name.clone()))
                    .collect(),
            });
        }

        Ok(self.root)
    }
}

/// Deserialize a document into a tree
pub fn deserialize(text: &str) -> Result<Node, ParseError> {
    Parser::new().parse(text)
}
