/*!
 * Integration tests for file and directory translation runs
 */

use anyhow::Result;
use std::fs;
use tagtrans::app_config::{ModelConfig, TranslationOptions};
use tagtrans::app_controller::{Controller, FileOutcome};
use tagtrans::providers::mock::MockBackend;
use tagtrans::translation::RetryPolicy;
use crate::common::{self, SAMPLE_DOCUMENT, script_detector};

const EXPECTED_SAMPLE: &str = "# header
[Greet]
\t# polite form
\t<msg>
\t\tHello
\t</msg>
\t<done>
\t\tAlready English
\t</done>
[/Greet]
[Farewell]
\tGoodbye
[/Farewell]";

/// Test a full file translation: only Japanese nodes change, structure survives
#[tokio::test]
async fn test_runFile_withSampleDocument_shouldTranslateJapaneseNodes() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "in.txt", SAMPLE_DOCUMENT)?;
    let output = temp_dir.path().join("out/in.txt");

    let backend = MockBackend::new().with_loaded_model("main");
    backend.push_completion("Hello").push_completion("Goodbye");

    let mut options = TranslationOptions::new(&input, "main", ModelConfig::default());
    options.quiet = true;
    let controller = Controller::new(options, &backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    let outcome = controller.run_file(&input, Some(&output)).await?;
    match outcome {
        FileOutcome::Translated(report) => {
            assert_eq!(report.translated, 2);
            assert_eq!(report.skipped, 1);
        }
        FileOutcome::Skipped => panic!("file should have been translated"),
    }

    assert_eq!(fs::read_to_string(&output)?, EXPECTED_SAMPLE);
    assert_eq!(backend.request_count(), 2);
    Ok(())
}

/// Test a directory run: mirrored layout, existing outputs skipped
#[tokio::test]
async fn test_run_withDirectory_shouldMirrorTreeAndSkipExisting() -> Result<()> {
    common::init_test_logging();
    let input_root = common::create_temp_dir()?;
    let output_root = common::create_temp_dir()?;
    common::create_test_file(input_root.path(), "a.txt", "[A]\n\t猫\n[/A]")?;
    common::create_test_file(input_root.path(), "nested/b.txt", "[B]\n\t犬\n[/B]")?;
    common::create_test_file(input_root.path(), "nested/notes.md", "[C]\n\t鳥\n[/C]")?;
    common::create_test_file(output_root.path(), "a.txt", "[A]\n\tkept\n[/A]")?;

    let backend = MockBackend::new().with_loaded_model("main");
    backend.push_completion("Dog");

    let mut options = TranslationOptions::new(input_root.path(), "main", ModelConfig::default());
    options.output_path = Some(output_root.path().to_path_buf());
    options.quiet = true;
    let controller = Controller::new(options, &backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    let summary = controller.run_folder(input_root.path(), output_root.path()).await?;

    assert_eq!(summary.files_translated, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.files_failed, 0);
    assert_eq!(fs::read_to_string(output_root.path().join("a.txt"))?, "[A]\n\tkept\n[/A]");
    assert_eq!(fs::read_to_string(output_root.path().join("nested/b.txt"))?, "[B]\n\tDog\n[/B]");
    assert!(!output_root.path().join("nested/notes.md").exists());
    Ok(())
}

/// Test that a broken file is counted and the run continues
#[tokio::test]
async fn test_runFolder_withBrokenFile_shouldContinue() -> Result<()> {
    common::init_test_logging();
    let input_root = common::create_temp_dir()?;
    let output_root = common::create_temp_dir()?;
    common::create_test_file(input_root.path(), "a.txt", "[A]\n\t<x>\n[/A]")?;
    common::create_test_file(input_root.path(), "b.txt", "[B]\n\t犬\n[/B]")?;

    let backend = MockBackend::new().with_loaded_model("main");
    backend.push_completion("Dog");

    let mut options = TranslationOptions::new(input_root.path(), "main", ModelConfig::default());
    options.quiet = true;
    let controller = Controller::new(options, &backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    let summary = controller.run_folder(input_root.path(), output_root.path()).await?;

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_translated, 1);
    assert!(!output_root.path().join("a.txt").exists());
    Ok(())
}

/// Test that a model load failure aborts the directory run
#[tokio::test]
async fn test_runFolder_withFailingModelLoad_shouldAbort() -> Result<()> {
    common::init_test_logging();
    let input_root = common::create_temp_dir()?;
    let output_root = common::create_temp_dir()?;
    common::create_test_file(input_root.path(), "a.txt", "[A]\n\t猫\n[/A]")?;
    common::create_test_file(input_root.path(), "b.txt", "[B]\n\t犬\n[/B]")?;

    let backend = MockBackend::new().failing_loads();
    let mut options = TranslationOptions::new(input_root.path(), "main", ModelConfig::default());
    options.quiet = true;
    let controller = Controller::new(options, &backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    assert!(controller.run_folder(input_root.path(), output_root.path()).await.is_err());
    assert_eq!(backend.request_count(), 0);
    Ok(())
}
