/*!
 * Translation of the text nodes of a markup tree using an LLM backend.
 *
 * This module is split into several submodules:
 *
 * - `collector`: Selection of the nodes that still need translating
 * - `validation`: Heuristic acceptance checks for candidate translations
 * - `extraction`: Recovering the answer from reasoning responses
 * - `prompts`: Prompt templates and request payloads
 * - `tags`: Shielding inline tags behind placeholders
 * - `core`: Direct and draft-then-refine translation of one text
 * - `orchestrator`: Tree-level batch loop with reinsertion and cleanup
 */

// Re-export main types for easier usage
pub use self::collector::{PROCESSED_MARKER, cleanup_markers, collect_text_nodes};
pub use self::core::{RefineRequest, RetryPolicy, StageRequest, Translator};
pub use self::extraction::{extract_translation, strip_thinking};
pub use self::orchestrator::{BatchReport, TreeTranslator};
pub use self::validation::{Rejection, TranslationValidator};

// Submodules
pub mod collector;
pub mod core;
pub mod extraction;
pub mod orchestrator;
pub mod prompts;
pub mod tags;
pub mod validation;
