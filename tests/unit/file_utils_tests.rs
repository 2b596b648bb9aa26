/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use tagtrans::file_utils::{FileManager, merge_file};
use tagtrans::markup;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.txt", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that find_files walks subdirectories in a stable order
#[test]
fn test_find_files_withNestedTree_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.txt", "")?;
    common::create_test_file(temp_dir.path(), "a/c.txt", "")?;
    common::create_test_file(temp_dir.path(), "a/skip.json", "")?;

    let files = FileManager::find_files(temp_dir.path(), "txt")?;
    let relative: Vec<_> = files
        .iter()
        .map(|path| path.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
        .collect();

    assert_eq!(relative, vec![std::path::PathBuf::from("a/c.txt"), std::path::PathBuf::from("b.txt")]);
    Ok(())
}

/// Test that copy_file creates the destination directory
#[test]
fn test_copy_file_withMissingTargetDir_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "source.txt", "payload")?;
    let target = temp_dir.path().join("x/y/target.txt");

    FileManager::copy_file(&source, &target)?;
    assert_eq!(fs::read_to_string(target)?, "payload");
    Ok(())
}

/// Test that copy_file fails for a missing source
#[test]
fn test_copy_file_withMissingSource_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = FileManager::copy_file(temp_dir.path().join("none.txt"), temp_dir.path().join("out.txt"));
    assert!(result.is_err());
    Ok(())
}

/// Test that merge_file overwrites the output with the merged tree
#[test]
fn test_merge_file_withBothSides_shouldWriteMergedTree() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.txt", "[A]\n\tnew\n[/A]")?;
    let output = common::create_test_file(temp_dir.path(), "out.txt", "[A]\n\told\n[/A]\n[B]\n\tb\n[/B]")?;

    merge_file(&input, &output)?;

    let merged = markup::deserialize(&fs::read_to_string(&output)?)?;
    assert_eq!(merged.child("A").and_then(|n| n.text.as_deref()), Some("new"));
    assert_eq!(merged.child("B").and_then(|n| n.text.as_deref()), Some("b"));
    // input untouched
    assert_eq!(fs::read_to_string(&input)?, "[A]\n\tnew\n[/A]");
    Ok(())
}

/// Test that merge_file leaves the output alone when the input does not parse
#[test]
fn test_merge_file_withBrokenInput_shouldNotTouchOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.txt", "[A]\n\t<b>\n[/A]")?;
    let output = common::create_test_file(temp_dir.path(), "out.txt", "[A]\n\told\n[/A]")?;

    assert!(merge_file(&input, &output).is_err());
    assert_eq!(fs::read_to_string(&output)?, "[A]\n\told\n[/A]");
    Ok(())
}
