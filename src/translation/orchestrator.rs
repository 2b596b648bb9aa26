/*!
 * Tree-level translation: collect, translate, reinsert, clean up.
 *
 * Nodes are processed one at a time in document order. An accepted
 * translation is written back behind the processed marker so a second pass
 * over the same tree skips it; markers are removed once the pass is over.
 * A node whose translation fails keeps its original text and the batch moves
 * on, except when a model cannot be loaded, which stops the batch.
 */

use indicatif::ProgressBar;
use log::{error, info};

use super::collector::{PROCESSED_MARKER, cleanup_markers, collect_text_nodes};
use super::core::{RefineRequest, StageRequest, Translator};
use crate::app_config::{Stage, TranslationOptions};
use crate::errors::{AppError, ConfigError, TranslationError};
use crate::markup::{self, Node};

/// Outcome counts of one tree pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Nodes whose text was replaced
    pub translated: usize,
    /// Nodes left untouched after exhausting retries
    pub failed: usize,
    /// Text nodes that did not need translating
    pub skipped: usize,
}

/// Drives a `Translator` over every translatable node of a tree
pub struct TreeTranslator<'a> {
    translator: Translator<'a>,
    options: &'a TranslationOptions,
    progress: Option<ProgressBar>,
}

impl<'a> TreeTranslator<'a> {
    /// Create an orchestrator; fails if the options are inconsistent
    pub fn new(translator: Translator<'a>, options: &'a TranslationOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            translator,
            options,
            progress: None,
        })
    }

    /// Report per-node progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Parse `content`, translate it and serialize the result
    pub async fn translate_content(&self, content: &str) -> Result<(String, BatchReport), AppError> {
        let mut tree = markup::deserialize(content)?;
        let report = self.translate_tree(&mut tree).await?;
        Ok((markup::serialize(&tree), report))
    }

    /// Translate every collectible node and strip the processed markers
    pub async fn translate_tree(&self, tree: &mut Node) -> Result<BatchReport, TranslationError> {
        let report = self.translate_nodes(tree).await?;
        cleanup_markers(tree);
        Ok(report)
    }

    /// Translate every collectible node, leaving processed markers in place
    pub async fn translate_nodes(&self, tree: &mut Node) -> Result<BatchReport, TranslationError> {
        let paths = collect_text_nodes(tree, self.translator.detector());
        let mut report = BatchReport {
            skipped: count_text_nodes(tree) - paths.len(),
            ..BatchReport::default()
        };

        if paths.is_empty() {
            info!("No text to translate.");
            return Ok(report);
        }

        if !self.uses_refine() {
            self.translator
                .ensure_model(&self.options.model_name, &self.options.model_config)
                .await?;
        }

        if let Some(progress) = &self.progress {
            progress.set_length(paths.len() as u64);
        }

        for path in &paths {
            let Some(original) = tree.node_at(path).and_then(|node| node.text.clone()) else {
                continue;
            };

            match self.translate_text(&original).await {
                Ok(translated) => {
                    let value = if translated.is_empty() { original } else { translated };
                    if let Some(node) = tree.node_at_mut(path) {
                        node.text = Some(format!("{}{}", PROCESSED_MARKER, value));
                    }
                    report.translated += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("Failed to translate node '{}': {}", display_path(path), e);
                    report.failed += 1;
                }
            }

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        }

        Ok(report)
    }

    /// Translate one node's text, line by line if configured
    pub async fn translate_text(&self, text: &str) -> Result<String, TranslationError> {
        if !self.options.line_by_line {
            return self.translate_unit(text, false).await;
        }

        let mut output = String::with_capacity(text.len());
        for piece in text.split_inclusive('\n') {
            let (content, terminator) = split_terminator(piece);
            if content.trim().is_empty() {
                output.push_str(piece);
                continue;
            }
            output.push_str(&self.translate_unit(content, true).await?);
            output.push_str(terminator);
        }
        Ok(output)
    }

    async fn translate_unit(&self, text: &str, line_by_line: bool) -> Result<String, TranslationError> {
        let options = self.options;
        let glossary = options.glossary_text.as_deref();

        match (&options.draft_model, &options.draft_model_config) {
            (Some(draft_model), Some(draft_config)) if options.refine_mode => {
                let request = RefineRequest {
                    draft_model,
                    draft_config,
                    refine_model: &options.model_name,
                    refine_config: &options.model_config,
                    num_drafts: options.num_drafts,
                    glossary,
                    glossary_for: options.glossary_for,
                    reasoning_for: options.reasoning_for,
                    line_by_line,
                };
                self.translator.translate_refine(text, &request).await
            }
            _ => {
                let stage = StageRequest {
                    model_name: &options.model_name,
                    config: &options.model_config,
                    glossary: glossary.filter(|_| options.glossary_for.applies_to(Stage::Main)),
                    reasoning: options.reasoning_for.applies_to(Stage::Main),
                    line_by_line,
                };
                self.translator.translate_direct(text, &stage).await
            }
        }
    }

    fn uses_refine(&self) -> bool {
        self.options.refine_mode && self.options.draft_model.is_some()
    }
}

/// Split a line from `split_inclusive('\n')` into content and its terminator
fn split_terminator(piece: &str) -> (&str, &str) {
    if let Some(content) = piece.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = piece.strip_suffix('\n') {
        (content, "\n")
    } else {
        (piece, "")
    }
}

fn count_text_nodes(tree: &Node) -> usize {
    let mut count = 0;
    tree.walk(&mut |_, node| {
        if node.text.is_some() {
            count += 1;
        }
    });
    count
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join("/")
    }
}
