/*!
 * Translation of a single text, directly or through drafts and refinement.
 *
 * Every completion request is retried with exponential backoff, both when the
 * backend fails and when the validator rejects the result. Model switches are
 * never retried: a failed load is reported as `TranslationError::ModelLoad`.
 */

use log::{debug, warn};
use serde_json::Value;
use std::time::Duration;

use super::extraction::extract_translation;
use super::prompts::{build_payload, refine_prompt, response_text, translation_prompt};
use super::tags::ProtectedText;
use super::validation::TranslationValidator;
use crate::app_config::{GlossaryScope, ModelConfig, ReasoningScope, Stage};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::LanguageDetector;
use crate::providers::{Backend, ensure_model_loaded};

/// How often and how patiently a request is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `base * 2^n`
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no waiting
    pub fn immediate() -> Self {
        Self {
            backoff_base_ms: 0,
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << attempt.min(16)))
    }

    async fn wait(&self, attempt: u32) {
        let delay = self.backoff(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// One model call: which model, how to prompt it, how strictly to validate
#[derive(Debug, Clone, Copy)]
pub struct StageRequest<'r> {
    pub model_name: &'r str,
    pub config: &'r ModelConfig,
    pub glossary: Option<&'r str>,
    /// Use the reasoning template and extract the answer from the response
    pub reasoning: bool,
    /// Reject multi-line results
    pub line_by_line: bool,
}

/// Draft-then-refine settings
#[derive(Debug, Clone, Copy)]
pub struct RefineRequest<'r> {
    pub draft_model: &'r str,
    pub draft_config: &'r ModelConfig,
    pub refine_model: &'r str,
    pub refine_config: &'r ModelConfig,
    pub num_drafts: usize,
    pub glossary: Option<&'r str>,
    pub glossary_for: GlossaryScope,
    pub reasoning_for: ReasoningScope,
    pub line_by_line: bool,
}

impl<'r> RefineRequest<'r> {
    fn draft_stage(&self) -> StageRequest<'r> {
        StageRequest {
            model_name: self.draft_model,
            config: self.draft_config,
            glossary: self.glossary.filter(|_| self.glossary_for.applies_to(Stage::Draft)),
            reasoning: self.reasoning_for.applies_to(Stage::Draft),
            line_by_line: self.line_by_line,
        }
    }

    fn refine_stage(&self) -> StageRequest<'r> {
        StageRequest {
            model_name: self.refine_model,
            config: self.refine_config,
            glossary: self.glossary.filter(|_| self.glossary_for.applies_to(Stage::Refine)),
            reasoning: self.reasoning_for.applies_to(Stage::Refine),
            line_by_line: self.line_by_line,
        }
    }
}

/// Translates single texts against a backend
pub struct Translator<'a> {
    backend: &'a dyn Backend,
    detector: &'a dyn LanguageDetector,
    retry: RetryPolicy,
}

impl<'a> Translator<'a> {
    pub fn new(backend: &'a dyn Backend, detector: &'a dyn LanguageDetector) -> Self {
        Self {
            backend,
            detector,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &'a dyn Backend {
        self.backend
    }

    pub fn detector(&self) -> &'a dyn LanguageDetector {
        self.detector
    }

    /// Make `model_name` current on the backend
    pub async fn ensure_model(&self, model_name: &str, config: &ModelConfig) -> Result<(), TranslationError> {
        ensure_model_loaded(self.backend, model_name, config)
            .await
            .map(|_| ())
            .map_err(TranslationError::ModelLoad)
    }

    /// Translate `text` with one model call (plus retries)
    ///
    /// The caller is responsible for having loaded `stage.model_name`.
    pub async fn translate_direct(&self, text: &str, stage: &StageRequest<'_>) -> Result<String, TranslationError> {
        let protected = stage.config.protect_tags.then(|| ProtectedText::protect(text));
        let prompt_text = protected.as_ref().map_or(text, |p| p.text.as_str());

        let prompt = translation_prompt(stage.config, prompt_text, stage.reasoning, stage.glossary);
        debug!("Translation prompt:\n{}", prompt);
        let payload = build_payload(stage.model_name, stage.config, &prompt);

        self.complete_validated(text, payload, stage, protected.as_ref()).await
    }

    /// Generate drafts with the draft model, then merge them with the refine model
    pub async fn translate_refine(&self, text: &str, request: &RefineRequest<'_>) -> Result<String, TranslationError> {
        let draft_stage = request.draft_stage();
        self.ensure_model(request.draft_model, request.draft_config).await?;

        let mut drafts = Vec::with_capacity(request.num_drafts);
        for index in 0..request.num_drafts {
            let draft = self.translate_direct(text, &draft_stage).await?;
            debug!("Draft {}/{}: {}", index + 1, request.num_drafts, draft);
            drafts.push(draft);
        }

        let refine_stage = request.refine_stage();
        self.ensure_model(request.refine_model, request.refine_config).await?;

        let protected = refine_stage.config.protect_tags.then(|| ProtectedText::protect(text));
        let prompt_text = protected.as_ref().map_or(text, |p| p.text.as_str());
        // drafts come back restored; show them in the same placeholder form as the source
        let shown_drafts: Vec<String> = match &protected {
            Some(protected) => drafts.iter().map(|draft| protected.shield(draft)).collect(),
            None => drafts,
        };
        let prompt = refine_prompt(
            refine_stage.config,
            prompt_text,
            &shown_drafts,
            refine_stage.reasoning,
            refine_stage.glossary,
        );
        debug!("Refinement prompt:\n{}", prompt);
        let payload = build_payload(refine_stage.model_name, refine_stage.config, &prompt);

        self.complete_validated(text, payload, &refine_stage, protected.as_ref())
            .await
    }

    /// Send `payload` until a response passes validation or attempts run out
    async fn complete_validated(
        &self,
        original: &str,
        payload: Value,
        stage: &StageRequest<'_>,
        protected: Option<&ProtectedText>,
    ) -> Result<String, TranslationError> {
        let validator = TranslationValidator::new(self.detector);
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..attempts {
            match self.backend.invoke(&stage.config.endpoint, payload.clone()).await {
                Ok(body) => {
                    last_error = None;
                    let raw = response_text(stage.config, &body);
                    let mut candidate = if stage.reasoning {
                        extract_translation(&raw, stage.config.use_json_format)
                    } else {
                        raw
                    };
                    if let Some(protected) = protected {
                        candidate = protected.restore(&candidate);
                    }

                    match validator.check(original, &candidate, stage.line_by_line) {
                        Ok(()) => return Ok(candidate),
                        Err(rejection) => warn!(
                            "Translation failed validation ({}). Retrying... (Attempt {}/{})",
                            rejection,
                            attempt + 1,
                            attempts
                        ),
                    }
                }
                Err(e) if !e.is_retryable() => return Err(TranslationError::ModelLoad(e)),
                Err(e) => {
                    warn!("Request failed: {}. Retrying... (Attempt {}/{})", e, attempt + 1, attempts);
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                self.retry.wait(attempt).await;
            }
        }

        Err(match last_error {
            Some(source) => TranslationError::Provider { attempts, source },
            None => TranslationError::ValidationExhausted {
                attempts,
                excerpt: original.chars().take(50).collect(),
            },
        })
    }
}
