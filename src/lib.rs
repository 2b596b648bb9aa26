/*!
 * # tagtrans - LLM translation of structured markup files
 *
 * A Rust library for translating the text of bracket/angle markup documents
 * with models served by a local text-generation-webui instance.
 *
 * ## Features
 *
 * - Lossless parsing and serialization of `[Group]`/`<element>` markup trees
 * - Left-priority deep merge of two trees, and of two directory trees
 * - Translation of every non-English text node:
 *   - Direct mode (one model)
 *   - Refine mode (several drafts from a draft model, refined by the main model)
 *   - Optional line-by-line translation and glossary injection
 * - Validation of every candidate translation before it is accepted
 * - Model configuration files with inheritance
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `markup`: Tree type, parser, serializer and merge
 * - `translation`: Translation of trees:
 *   - `translation::collector`: Finding the nodes that need translating
 *   - `translation::validation`: Candidate acceptance rules
 *   - `translation::core`: Direct and refine translators with retries
 *   - `translation::orchestrator`: Tree-level batch loop
 * - `providers`: LLM backend contract and clients:
 *   - `providers::webui`: text-generation-webui API client
 *   - `providers::mock`: Scripted backend for tests
 * - `language_utils`: Language detection and ISO code utilities
 * - `app_config`: Model configuration and run options
 * - `file_utils`: File system operations and directory merging
 * - `app_controller`: File and directory translation runs
 * - `errors`: Custom error types for the application
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{ModelConfig, ModelConfigs, TranslationOptions};
pub use errors::{AppError, ConfigError, ParseError, ProviderError, TranslationError};
pub use language_utils::{LanguageDetector, WhatlangDetector, language_codes_match};
pub use markup::{Node, NodePath, deserialize, merge, serialize};
pub use translation::{BatchReport, Translator, TreeTranslator};
