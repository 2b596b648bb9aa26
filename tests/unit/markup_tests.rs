/*!
 * Tests for markup parsing, serialization and merging
 */

use anyhow::Result;
use tagtrans::errors::ParseError;
use tagtrans::markup::{self, Node};
use crate::common::SAMPLE_DOCUMENT;

/// Test that a document parses into the expected tree
#[test]
fn test_deserialize_withSampleDocument_shouldBuildTree() -> Result<()> {
    let tree = markup::deserialize(SAMPLE_DOCUMENT)?;

    let greet = tree.child("Greet").expect("Greet group");
    assert_eq!(greet.comments, vec!["header".to_string()]);

    let msg = greet.child("msg").expect("msg element");
    assert_eq!(msg.text.as_deref(), Some("こんにちは"));
    assert_eq!(msg.comments, vec!["polite form".to_string()]);

    let farewell = tree.child("Farewell").expect("Farewell group");
    assert_eq!(farewell.text.as_deref(), Some("さようなら"));

    let names: Vec<&str> = tree.children.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Greet", "Farewell"]);
    Ok(())
}

/// Test that serializing and reparsing yields the same tree
#[test]
fn test_serialize_thenDeserialize_shouldPreserveTree() -> Result<()> {
    let tree = markup::deserialize(SAMPLE_DOCUMENT)?;
    let reparsed = markup::deserialize(&markup::serialize(&tree))?;
    assert_eq!(tree, reparsed);
    Ok(())
}

/// Test that a wrong closing tag reports the offending line
#[test]
fn test_deserialize_withMismatchedClose_shouldFail() {
    let error = markup::deserialize("[A]\n\t<b>\n\t</c>\n[/A]").unwrap_err();
    match error {
        ParseError::MismatchedTag { raw, line } => {
            assert_eq!(raw, "</c>");
            assert_eq!(line, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test that unclosed tags are reported at end of input
#[test]
fn test_deserialize_withUnclosedTag_shouldFail() {
    let error = markup::deserialize("[A]\n\t<b>\n\t\ttext").unwrap_err();
    assert!(matches!(error, ParseError::UnclosedTags { .. }));
}

/// Test that the primary tree wins on conflicts and the secondary fills gaps
#[test]
fn test_merge_shouldPreferPrimaryAndKeepSecondaryOnlyNodes() -> Result<()> {
    let primary = markup::deserialize("[A]\n\t<x>\n\t\tnew\n\t</x>\n[/A]")?;
    let secondary = markup::deserialize("[A]\n\t<x>\n\t\told\n\t</x>\n\t<y>\n\t\tkept\n\t</y>\n[/A]\n[B]\n\tb\n[/B]")?;

    let merged = markup::merge(&primary, &secondary);

    let a = merged.child("A").expect("A group");
    assert_eq!(a.child("x").and_then(|n| n.text.as_deref()), Some("new"));
    assert_eq!(a.child("y").and_then(|n| n.text.as_deref()), Some("kept"));
    assert!(merged.child("B").is_some());

    // inputs untouched
    assert!(primary.child("B").is_none());
    Ok(())
}

/// Test that merging with an empty tree is the identity
#[test]
fn test_merge_withEmptySecondary_shouldReturnPrimary() -> Result<()> {
    let primary = markup::deserialize(SAMPLE_DOCUMENT)?;
    assert_eq!(markup::merge(&primary, &Node::new()), primary);
    Ok(())
}
