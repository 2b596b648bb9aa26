/*!
 * Tests for model configuration loading
 */

use anyhow::Result;
use serde_json::json;
use tagtrans::app_config::{ModelConfig, ModelConfigs, TranslationOptions};
use tagtrans::errors::ConfigError;
use crate::common::{self, MODELS_JSON};

/// Test that a configuration file on disk loads with inheritance resolved
#[test]
fn test_load_withInheritance_shouldDeepMergeParent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "models.json", MODELS_JSON)?;

    let configs = ModelConfigs::load(&path)?;
    let tuned = configs.get("tuned")?;

    assert_eq!(tuned.endpoint, "chat/completions");
    assert_eq!(tuned.system_prompt.as_deref(), Some("You translate Japanese to English."));
    assert_eq!(tuned.params.get("temperature"), Some(&json!(0.1)));
    assert_eq!(tuned.params.get("max_tokens"), Some(&json!(256)));
    assert!(tuned.extra_flags.contains_key("no_flash_attn"));
    assert!(tuned.is_chat());
    Ok(())
}

/// Test that unknown models fall back to the default entry
#[test]
fn test_get_withUnknownModel_shouldUseDefault() -> Result<()> {
    let configs = ModelConfigs::from_json_str(MODELS_JSON, "models.json")?;
    let fallback = configs.get("something-else")?;

    assert_eq!(fallback.prompt_template, "Translate: {text}");
    assert_eq!(fallback.endpoint, ModelConfig::default().endpoint);
    Ok(())
}

/// Test that a missing file is reported as such
#[test]
fn test_load_withMissingFile_shouldReturnNotFound() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let error = ModelConfigs::load(&temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(error, ConfigError::NotFound(_)));
    Ok(())
}

/// Test that malformed JSON is reported with the file path
#[test]
fn test_load_withInvalidJson_shouldNamePath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    let error = ModelConfigs::load(&path).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidJson { .. }));
    assert!(error.to_string().contains("broken.json"));
    Ok(())
}

/// Test that refine options without drafts are rejected
#[test]
fn test_validate_withZeroDrafts_shouldFail() {
    let options = TranslationOptions::new("in.txt", "main", ModelConfig::default()).with_refine(
        "draft",
        ModelConfig::default(),
        0,
    );
    assert!(options.validate().is_err());
}
