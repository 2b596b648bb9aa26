use indexmap::IndexMap;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles the per-model configuration file (`models.json`),
/// the stage scopes for glossary and reasoning prompts, and the options
/// record for one translation run.

/// Key of the fallback entry in the model configuration file
pub const DEFAULT_CONFIG_KEY: &str = "_default";

/// Endpoint that takes a `messages` array instead of a flat prompt
pub const CHAT_ENDPOINT: &str = "chat/completions";

/// Configuration of one model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Completion endpoint, `"completions"` or `"chat/completions"`
    pub endpoint: String,

    /// Prompt for direct translation; `{text}` is replaced by the source text
    pub prompt_template: String,

    /// Prompt used instead of `prompt_template` when reasoning is requested
    pub reasoning_prompt_template: String,

    /// Refinement prompt; `{original_text}` and `{draft_list}` are substituted
    pub refine_prompt_template: String,

    /// Refinement prompt used when reasoning is requested
    pub refine_reasoning_prompt_template: String,

    /// Optional system message for the chat endpoint
    pub system_prompt: Option<String>,

    /// Sampling parameters merged verbatim into every request
    pub params: Map<String, Value>,

    /// Whether reasoning responses carry a JSON `{"translation": ...}` object
    pub use_json_format: bool,

    /// Loader flags sent when this model is loaded
    pub extra_flags: IndexMap<String, Value>,

    /// Shield `<...>` tags from the model behind numbered placeholders
    pub protect_tags: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            prompt_template: default_prompt_template(),
            reasoning_prompt_template: default_prompt_template(),
            refine_prompt_template: default_refine_template(),
            refine_reasoning_prompt_template: default_refine_template(),
            system_prompt: None,
            params: Map::new(),
            use_json_format: false,
            extra_flags: IndexMap::new(),
            protect_tags: false,
        }
    }
}

impl ModelConfig {
    /// Whether requests use the chat message format
    pub fn is_chat(&self) -> bool {
        self.endpoint == CHAT_ENDPOINT
    }
}

fn default_endpoint() -> String {
    "completions".to_string()
}

fn default_prompt_template() -> String {
    "{text}".to_string()
}

fn default_refine_template() -> String {
    "Refine: {draft_list}".to_string()
}

/// All model configurations of a `models.json` file, inheritance resolved
#[derive(Debug, Clone, Default)]
pub struct ModelConfigs {
    configs: IndexMap<String, ModelConfig>,
}

impl ModelConfigs {
    /// Load and resolve a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::InvalidJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json_str(&content, &path.display().to_string())
    }

    /// Parse and resolve configuration text; `source` names it in errors
    pub fn from_json_str(content: &str, source: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidJson {
            path: source.to_string(),
            message,
        };

        let raw: IndexMap<String, Value> =
            serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;

        let mut configs = IndexMap::new();
        for name in raw.keys() {
            let resolved = resolve_inheritance(name, &raw, &mut Vec::new())?;
            let config: ModelConfig =
                serde_json::from_value(resolved).map_err(|e| invalid(format!("model '{}': {}", name, e)))?;
            configs.insert(name.clone(), config);
        }

        Ok(Self { configs })
    }

    /// Config for `model_name`, falling back to the `_default` entry
    pub fn get(&self, model_name: &str) -> Result<&ModelConfig, ConfigError> {
        self.configs
            .get(model_name)
            .or_else(|| self.configs.get(DEFAULT_CONFIG_KEY))
            .ok_or_else(|| ConfigError::UnknownModel {
                model: model_name.to_string(),
                default_key: DEFAULT_CONFIG_KEY.to_string(),
            })
    }

    /// Names of all configured models
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

/// Resolve `name` against its `inherits` chain, child values winning
fn resolve_inheritance(
    name: &str,
    raw: &IndexMap<String, Value>,
    chain: &mut Vec<String>,
) -> Result<Value, ConfigError> {
    let mut config = raw.get(name).cloned().unwrap_or_else(|| Value::Object(Map::new()));

    let parent = config
        .as_object_mut()
        .and_then(|object| object.remove("inherits"))
        .and_then(|value| value.as_str().map(str::to_string));

    let Some(parent) = parent else {
        return Ok(config);
    };

    if !raw.contains_key(&parent) {
        return Err(ConfigError::UnknownParent {
            model: name.to_string(),
            parent,
        });
    }
    if chain.iter().any(|seen| seen == &parent) || parent == name {
        return Err(ConfigError::InheritanceCycle {
            model: name.to_string(),
            parent,
        });
    }

    chain.push(name.to_string());
    let mut merged = resolve_inheritance(&parent, raw, chain)?;
    chain.pop();

    deep_merge(&mut merged, config);
    Ok(merged)
}

/// Merge `overlay` into `base`; nested objects merge, everything else is replaced
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let nested = value.is_object() && base_map.get(&key).is_some_and(Value::is_object);
                if nested {
                    if let Some(existing) = base_map.get_mut(&key) {
                        deep_merge(existing, value);
                    }
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Stage of a translation a prompt is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Direct translation
    Main,
    /// Draft generation in refine mode
    Draft,
    /// Refinement of the drafts
    Refine,
}

/// Stages that receive the glossary in refine mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GlossaryScope {
    Draft,
    Refine,
    #[default]
    All,
}

impl GlossaryScope {
    /// Direct translation always receives the glossary
    pub fn applies_to(self, stage: Stage) -> bool {
        match stage {
            Stage::Main => true,
            Stage::Draft => matches!(self, Self::Draft | Self::All),
            Stage::Refine => matches!(self, Self::Refine | Self::All),
        }
    }
}

/// Stages that use the reasoning prompt templates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningScope {
    #[default]
    None,
    Draft,
    Refine,
    Main,
    All,
}

impl ReasoningScope {
    pub fn applies_to(self, stage: Stage) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Draft => stage == Stage::Draft,
            Self::Refine => stage == Stage::Refine,
            Self::Main => stage == Stage::Main,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Everything one translation run needs
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Input file or directory
    pub input_path: PathBuf,
    /// Output file or directory; stdout when absent
    pub output_path: Option<PathBuf>,
    /// Model used for direct translation, and for refinement in refine mode
    pub model_name: String,
    pub model_config: ModelConfig,
    /// Model used for drafts in refine mode
    pub draft_model: Option<String>,
    pub draft_model_config: Option<ModelConfig>,
    pub refine_mode: bool,
    pub num_drafts: usize,
    /// Translate each non-blank line on its own
    pub line_by_line: bool,
    pub glossary_text: Option<String>,
    pub glossary_for: GlossaryScope,
    pub reasoning_for: ReasoningScope,
    /// Replace existing output files
    pub overwrite: bool,
    /// Suppress progress output
    pub quiet: bool,
}

impl TranslationOptions {
    /// Options for a direct translation of `input_path` with `model_name`
    pub fn new(input_path: impl Into<PathBuf>, model_name: &str, model_config: ModelConfig) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            model_name: model_name.to_string(),
            model_config,
            draft_model: None,
            draft_model_config: None,
            refine_mode: false,
            num_drafts: 6,
            line_by_line: false,
            glossary_text: None,
            glossary_for: GlossaryScope::default(),
            reasoning_for: ReasoningScope::default(),
            overwrite: false,
            quiet: false,
        }
    }

    /// Switch to refine mode with the given draft model
    pub fn with_refine(mut self, draft_model: &str, draft_model_config: ModelConfig, num_drafts: usize) -> Self {
        self.refine_mode = true;
        self.draft_model = Some(draft_model.to_string());
        self.draft_model_config = Some(draft_model_config);
        self.num_drafts = num_drafts;
        self
    }

    /// Validate the options for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::InvalidOptions("a model name is required".to_string()));
        }

        if self.refine_mode {
            if self.draft_model.is_none() || self.draft_model_config.is_none() {
                return Err(ConfigError::InvalidOptions(
                    "refine mode requires a draft model".to_string(),
                ));
            }
            if self.num_drafts == 0 {
                return Err(ConfigError::InvalidOptions(
                    "at least one draft is required".to_string(),
                ));
            }
        }

        Ok(())
    }
}
