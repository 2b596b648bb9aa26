/*!
 * Integration tests for the directory merge workflow
 */

use anyhow::Result;
use std::fs;
use tagtrans::file_utils::{MergeReport, merge_directories};
use tagtrans::markup;
use crate::common;

/// Test merging two trees: counterparts merged, new files copied, structure mirrored
#[test]
fn test_mergeDirectories_shouldMergeCopyAndMirror() -> Result<()> {
    common::init_test_logging();
    let input_root = common::create_temp_dir()?;
    let output_root = common::create_temp_dir()?;

    common::create_test_file(input_root.path(), "shared.txt", "[A]\n\t<x>\n\t\tpatched\n\t</x>\n[/A]")?;
    common::create_test_file(input_root.path(), "sub/new.txt", "[N]\n\tfresh\n[/N]")?;
    common::create_test_file(input_root.path(), "sub/readme.md", "ignored")?;
    fs::create_dir_all(input_root.path().join("empty/inner"))?;

    common::create_test_file(
        output_root.path(),
        "shared.txt",
        "[A]\n\t<x>\n\t\toriginal\n\t</x>\n\t<y>\n\t\tuntouched\n\t</y>\n[/A]",
    )?;

    let report = merge_directories(input_root.path(), output_root.path())?;
    assert_eq!(report, MergeReport { copied: 1, merged: 1, failed: 0 });

    let shared = markup::deserialize(&fs::read_to_string(output_root.path().join("shared.txt"))?)?;
    let a = shared.child("A").expect("A group");
    assert_eq!(a.child("x").and_then(|n| n.text.as_deref()), Some("patched"));
    assert_eq!(a.child("y").and_then(|n| n.text.as_deref()), Some("untouched"));

    assert_eq!(
        fs::read_to_string(output_root.path().join("sub/new.txt"))?,
        "[N]\n\tfresh\n[/N]"
    );
    assert!(!output_root.path().join("sub/readme.md").exists());
    assert!(output_root.path().join("empty/inner").is_dir());
    Ok(())
}

/// Test that one unparsable file is counted and the walk continues
#[test]
fn test_mergeDirectories_withBrokenFile_shouldContinue() -> Result<()> {
    common::init_test_logging();
    let input_root = common::create_temp_dir()?;
    let output_root = common::create_temp_dir()?;

    common::create_test_file(input_root.path(), "a.txt", "[A]\n\t<open>\n[/A]")?;
    common::create_test_file(output_root.path(), "a.txt", "[A]\n\tfine\n[/A]")?;
    common::create_test_file(input_root.path(), "b.txt", "[B]\n\tcopied\n[/B]")?;

    let report = merge_directories(input_root.path(), output_root.path())?;

    assert_eq!(report, MergeReport { copied: 1, merged: 0, failed: 1 });
    assert_eq!(fs::read_to_string(output_root.path().join("a.txt"))?, "[A]\n\tfine\n[/A]");
    assert!(output_root.path().join("b.txt").exists());
    Ok(())
}
