/*!
 * Tests for tree translation against a scripted backend
 */

use anyhow::Result;
use serde_json::json;
use tagtrans::app_config::{GlossaryScope, ModelConfig, TranslationOptions};
use tagtrans::markup;
use tagtrans::providers::mock::MockBackend;
use tagtrans::translation::{BatchReport, RetryPolicy, Translator, TreeTranslator};
use crate::common::script_detector;

fn refine_options(num_drafts: usize) -> TranslationOptions {
    TranslationOptions::new("in.txt", "main", ModelConfig::default()).with_refine(
        "draft",
        ModelConfig::default(),
        num_drafts,
    )
}

/// Test that refine mode alternates models per node and lists every draft
#[tokio::test]
async fn test_refineMode_overTree_shouldSwitchModelsPerNode() -> Result<()> {
    let backend = MockBackend::new();
    backend
        .push_completion("Cat a")
        .push_completion("Cat b")
        .push_completion("Cat")
        .push_completion("Dog a")
        .push_completion("Dog b")
        .push_completion("Dog");
    let options = refine_options(2);
    let translator = Translator::new(&backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    let (output, report) = TreeTranslator::new(translator, &options)?
        .translate_content("[A]\n\t猫\n[/A]\n[B]\n\t犬\n[/B]")
        .await?;

    assert_eq!(output, "[A]\n\tCat\n[/A]\n[B]\n\tDog\n[/B]");
    assert_eq!(report, BatchReport { translated: 2, failed: 0, skipped: 0 });
    assert_eq!(backend.loads(), vec!["draft", "main", "draft", "main"]);

    let requests = backend.requests();
    assert_eq!(requests[0].payload["model"], json!("draft"));
    assert_eq!(requests[2].payload["model"], json!("main"));
    assert_eq!(requests[2].prompt(), Some("Refine: 1. ```Cat a```\n2. ```Cat b```"));
    Ok(())
}

/// Test that a refine-only glossary reaches the refine prompt but not the drafts
#[tokio::test]
async fn test_refineMode_withRefineGlossary_shouldOnlyPrefixRefinePrompt() -> Result<()> {
    let backend = MockBackend::new();
    backend.push_completion("Cat one").push_completion("Cat");
    let mut options = refine_options(1);
    options.glossary_text = Some("猫 = cat".to_string());
    options.glossary_for = GlossaryScope::Refine;
    let translator = Translator::new(&backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    let result = TreeTranslator::new(translator, &options)?.translate_text("猫").await?;
    assert_eq!(result, "Cat");

    let prompts: Vec<String> = backend
        .requests()
        .iter()
        .filter_map(|request| request.prompt().map(str::to_string))
        .collect();
    assert_eq!(prompts[0], "猫");
    assert!(prompts[1].starts_with("Please use this glossary for context:\n猫 = cat\n\n"));
    Ok(())
}

/// Test that the chat endpoint receives the system prompt and sampling params
#[tokio::test]
async fn test_directMode_withChatModel_shouldSendMessages() -> Result<()> {
    let backend = MockBackend::new().with_loaded_model("main");
    backend.push_completion("Good morning");
    let mut params = serde_json::Map::new();
    params.insert("temperature".to_string(), json!(0.3));
    let config = ModelConfig {
        endpoint: "chat/completions".to_string(),
        system_prompt: Some("Translate to English.".to_string()),
        params,
        ..ModelConfig::default()
    };
    let options = TranslationOptions::new("in.txt", "main", config);
    let translator = Translator::new(&backend, &script_detector).with_retry_policy(RetryPolicy::immediate());

    let mut tree = markup::deserialize("[A]\n\tおはよう\n[/A]")?;
    TreeTranslator::new(translator, &options)?.translate_tree(&mut tree).await?;

    assert_eq!(tree.child("A").and_then(|n| n.text.as_deref()), Some("Good morning"));
    let request = &backend.requests()[0];
    assert_eq!(request.endpoint, "chat/completions");
    assert_eq!(request.payload["temperature"], json!(0.3));
    assert_eq!(request.payload["messages"][0]["content"], json!("Translate to English."));
    assert_eq!(request.prompt(), Some("おはよう"));
    Ok(())
}
