/*!
 * Backend implementations for the LLM server.
 *
 * This module contains the contract every backend must follow and the
 * concrete clients:
 * - `webui`: HTTP client for an OpenAI-compatible text-generation-webui server
 * - `mock`: scripted backend for tests
 */

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use std::fmt::Debug;

use crate::app_config::ModelConfig;
use crate::errors::ProviderError;

/// Common trait for all LLM backends
///
/// A backend holds one "currently loaded" model at a time. Callers switch
/// models with `load_model` and then issue completion requests with `invoke`.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Name of the model currently loaded on the server, if any
    async fn current_model(&self) -> Result<Option<String>, ProviderError>;

    /// Load `model_name`, blocking until the server reports completion
    ///
    /// # Arguments
    /// * `model_name` - Model to load
    /// * `args` - Optional load arguments passed through to the server
    async fn load_model(&self, model_name: &str, args: Option<Value>) -> Result<(), ProviderError>;

    /// Send `payload` to `endpoint` (e.g. `"completions"`) and return the JSON body
    async fn invoke(&self, endpoint: &str, payload: Value) -> Result<Value, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.current_model().await.map(|_| ())
    }
}

pub mod mock;
pub mod webui;

/// Make `model_name` the loaded model unless it already is
///
/// # Returns
/// * `Ok(true)` if a load was issued, `Ok(false)` if the model was already current
pub async fn ensure_model_loaded(
    backend: &dyn Backend,
    model_name: &str,
    config: &ModelConfig,
) -> Result<bool, ProviderError> {
    let current = backend.current_model().await?;
    if current.as_deref() == Some(model_name) {
        return Ok(false);
    }

    info!(
        "Switching model from '{}' to '{}'...",
        current.as_deref().unwrap_or("none"),
        model_name
    );
    backend
        .load_model(model_name, webui::load_args(&config.extra_flags))
        .await?;
    Ok(true)
}

/// Probe the backend before a run, with a message that says what to fix
pub async fn check_server(backend: &dyn Backend) -> anyhow::Result<()> {
    backend.test_connection().await.map_err(|e| {
        anyhow::anyhow!(
            "Could not connect to the translation API server: {}. \
             Please ensure the text-generation-webui server is running and the API is enabled.",
            e
        )
    })
}
