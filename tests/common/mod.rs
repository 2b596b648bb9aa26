/*!
 * Common test utilities for the tagtrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use tagtrans::errors::DetectionError;

/// A document with groups, nested elements, comments and Japanese text
pub const SAMPLE_DOCUMENT: &str = "# header
[Greet]
\t# polite form
\t<msg>
\t\tこんにちは
\t</msg>
\t<done>
\t\tAlready English
\t</done>
[/Greet]
[Farewell]
\tさようなら
[/Farewell]";

/// Model configuration with an inheritance chain and a default entry
pub const MODELS_JSON: &str = r#"{
    "_default": {"prompt_template": "Translate: {text}"},
    "base": {
        "endpoint": "chat/completions",
        "system_prompt": "You translate Japanese to English.",
        "params": {"temperature": 0.7, "max_tokens": 256}
    },
    "tuned": {
        "inherits": "base",
        "params": {"temperature": 0.1},
        "extra_flags": {"no_flash_attn": null, "ctx_size": 8192}
    }
}"#;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content, creating parent directories
pub fn create_test_file(dir: &Path, relative_path: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(relative_path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Detector that reports Japanese for any kana or kanji, English otherwise
pub fn script_detector(text: &str) -> Result<String, DetectionError> {
    if text.chars().any(|c| ('\u{3040}'..='\u{9fff}').contains(&c)) {
        Ok("ja".to_string())
    } else {
        Ok("en".to_string())
    }
}

/// Route library logs through the test harness; set RUST_LOG to see them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
