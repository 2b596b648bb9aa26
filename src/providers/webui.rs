use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::Backend;

/// Default base URL of the text-generation-webui OpenAI-compatible API
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/v1";

/// Client for a text-generation-webui server
#[derive(Debug)]
pub struct WebUi {
    /// Base URL, always ending with a slash so endpoints join beneath it
    base_url: Url,
    /// HTTP client for completion requests
    client: Client,
    /// Timeout applied to model loads, which can take minutes
    load_timeout: Duration,
    /// Pause after a successful load before the model is used
    settle_delay: Duration,
}

/// Response of `internal/model/info`
#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    /// Name of the loaded model; absent or "None" when nothing is loaded
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Body of `internal/model/load`
#[derive(Debug, Serialize)]
pub struct LoadRequest<'a> {
    /// Model to load
    model_name: &'a str,
    /// Loader arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<Value>,
}

impl WebUi {
    /// Create a client for the API at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            load_timeout: Duration::from_secs(300),
            settle_delay: Duration::from_secs(5),
        })
    }

    /// Override the pause after model loads
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", endpoint, e)))
    }

    async fn read_json(response: reqwest::Response, endpoint: &str) -> Result<Value, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("API request to {} failed ({}): {}", endpoint, status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("{} returned invalid JSON: {}", endpoint, e)))
    }
}

#[async_trait]
impl Backend for WebUi {
    async fn current_model(&self) -> Result<Option<String>, ProviderError> {
        let url = self.endpoint_url("internal/model/info")?;
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("API request to internal/model/info failed: {}", e)))?;

        let body = Self::read_json(response, "internal/model/info").await?;
        let info: ModelInfo = serde_json::from_value(body)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(info.model_name.filter(|name| !name.is_empty() && name != "None"))
    }

    async fn load_model(&self, model_name: &str, args: Option<Value>) -> Result<(), ProviderError> {
        let url = self.endpoint_url("internal/model/load")?;
        let request = LoadRequest { model_name, args };
        debug!("Loading model '{}'", model_name);

        let load_error = |message: String| ProviderError::ModelLoad {
            model: model_name.to_string(),
            message,
        };

        let response = self
            .client
            .post(url)
            .timeout(self.load_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| load_error(e.to_string()))?;

        Self::read_json(response, "internal/model/load")
            .await
            .map_err(|e| load_error(e.to_string()))?;

        info!("Model '{}' loaded", model_name);
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    async fn invoke(&self, endpoint: &str, payload: Value) -> Result<Value, ProviderError> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {} with model {:?}", url, payload.get("model"));

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("API request to {} failed: {}", endpoint, e)))?;

        Self::read_json(response, endpoint).await
    }
}

/// Render loader flags as `key=value,flag,key2=value2`; an empty value leaves the bare key
pub fn format_extra_flags(flags: &IndexMap<String, Value>) -> String {
    flags
        .iter()
        .map(|(key, value)| match value {
            Value::Null => key.clone(),
            Value::String(s) if s.is_empty() => key.clone(),
            Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the `args` object sent with a model load, if the model has loader flags
pub fn load_args(extra_flags: &IndexMap<String, Value>) -> Option<Value> {
    if extra_flags.is_empty() {
        return None;
    }

    let mut args = Map::new();
    args.insert("extra_flags".to_string(), Value::String(format_extra_flags(extra_flags)));
    Some(Value::Object(args))
}
