/*!
 * Error types for the tagtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised while deserializing the bracket/angle markup format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A closing tag did not match the innermost open tag
    #[error("Mismatched closing tag '{raw}' on line {line}")]
    MismatchedTag {
        /// The closing tag as it appeared (trimmed code part)
        raw: String,
        /// 1-based line number
        line: usize,
    },

    /// The input ended while tags were still open
    #[error("Unclosed tags at end of file: {}", format_stack(.stack))]
    UnclosedTags {
        /// Open `(delimiter, name)` pairs, outermost first
        stack: Vec<(char, String)>,
    },
}

fn format_stack(stack: &[(char, String)]) -> String {
    let items: Vec<String> = stack
        .iter()
        .map(|(delimiter, name)| format!("('{}', '{}')", delimiter, name))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Language detection could not classify the input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Language detection failed: {0}")]
pub struct DetectionError(pub String);

/// Errors that can occur when talking to the LLM backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The backend could not be reached
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The backend refused or failed to load a model
    #[error("Failed to load model '{model}': {message}")]
    ModelLoad {
        /// Model that was requested
        model: String,
        /// Backend or transport message
        message: String,
    },
}

impl ProviderError {
    /// Transport and status failures are worth another attempt; a failed model
    /// load points at configuration and is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ModelLoad { .. })
    }
}

/// Errors that can occur during translation of a single text
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API after all attempts were used
    #[error("Provider error after {attempts} attempts: {source}")]
    Provider {
        /// Number of attempts made
        attempts: u32,
        /// Last provider failure
        #[source]
        source: ProviderError,
    },

    /// Every candidate was rejected by the validator
    #[error("Failed to get a valid translation for '{excerpt}...' after {attempts} attempts")]
    ValidationExhausted {
        /// Number of attempts made
        attempts: u32,
        /// First characters of the source text
        excerpt: String,
    },

    /// A required model could not be made current on the backend
    #[error("Model load failed: {0}")]
    ModelLoad(#[source] ProviderError),
}

impl TranslationError {
    /// Whether this failure should abort the whole batch rather than one node
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelLoad(_))
    }
}

/// Errors raised while loading model configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Model configuration file not found at: {0}")]
    NotFound(String),

    /// Configuration file is not valid JSON or has the wrong shape
    #[error("Error decoding JSON from {path}: {message}")]
    InvalidJson {
        /// Path of the offending file
        path: String,
        /// Decoder message
        message: String,
    },

    /// A model inherits from a parent that is not defined
    #[error("Model '{model}' inherits from non-existent model '{parent}'.")]
    UnknownParent {
        /// Child model
        model: String,
        /// Missing parent
        parent: String,
    },

    /// A model's `inherits` chain leads back to itself
    #[error("Model '{model}' has an inheritance cycle through '{parent}'.")]
    InheritanceCycle {
        /// Model being resolved
        model: String,
        /// Parent that closes the cycle
        parent: String,
    },

    /// Model not found and no default entry
    #[error("Model '{model}' not found in configuration, and no default ('{default_key}') is defined.")]
    UnknownModel {
        /// Requested model
        model: String,
        /// Fallback key that was tried
        default_key: String,
    },

    /// Options failed validation
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the markup parser
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
