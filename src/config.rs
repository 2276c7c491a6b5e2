//! Ollama adapter configuration.
//!
//! Built through [`OllamaConfig::builder`]; `build()` validates the result.

use serde_json::{Map, Value};

use crate::error::LlmError;
use crate::normalize::{PromptSelection, StructuredOutputMarkers};

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
/// Default model.
pub const DEFAULT_MODEL: &str = "qwen2.5";
/// Default thinking token budget, used only when thinking is enabled.
pub const DEFAULT_THINKING_BUDGET: u32 = 2048;
/// Environment variable consulted by [`OllamaConfig::from_env`].
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Immutable per-client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    /// Sent as `options.num_predict`.
    pub max_tokens: Option<u32>,
    /// Extra model options passed through verbatim.
    pub options: Map<String, Value>,
    /// Request NDJSON streaming from the backend.
    pub stream: bool,
    /// Keep model loaded duration (e.g. "5m").
    pub keep_alive: Option<String>,
    /// Ask thinking models to think before answering.
    pub think: bool,
    pub thinking_budget: u32,
    pub markers: StructuredOutputMarkers,
    pub prompt_selection: PromptSelection,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            options: Map::new(),
            stream: false,
            keep_alive: None,
            think: false,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            markers: StructuredOutputMarkers::default(),
            prompt_selection: PromptSelection::default(),
        }
    }
}

impl OllamaConfig {
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::default()
    }

    /// Default configuration with `base_url` taken from `OLLAMA_HOST` when set.
    pub fn from_env() -> Result<Self, LlmError> {
        let mut builder = Self::builder();
        if let Ok(host) = std::env::var(OLLAMA_HOST_ENV)
            && !host.trim().is_empty()
        {
            builder = builder.base_url(host);
        }
        builder.build()
    }

    /// Full URL of an API endpoint, e.g. `api/chat`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        validate_model_name(&self.model)?;
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(LlmError::ConfigurationError(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(LlmError::ConfigurationError(format!(
                "Temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if self.markers.sentinel_open.is_empty() || self.markers.sentinel_close.is_empty() {
            return Err(LlmError::ConfigurationError(
                "Sentinel tags cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validate model name format
pub fn validate_model_name(model: &str) -> Result<(), LlmError> {
    if model.is_empty() {
        return Err(LlmError::ConfigurationError(
            "Model name cannot be empty".to_string(),
        ));
    }

    if model.contains(' ') || model.contains('\n') || model.contains('\t') {
        return Err(LlmError::ConfigurationError(
            "Model name contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Builder for [`OllamaConfig`].
#[derive(Debug, Clone, Default)]
pub struct OllamaConfigBuilder {
    config: OllamaConfig,
}

impl OllamaConfigBuilder {
    /// Set the base URL (e.g. "http://localhost:11434")
    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the model (e.g. "llama3.2", "mistral:7b")
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.config.model = model.into();
        self
    }

    pub const fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Add a model option passed through to `options`.
    pub fn option<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.config.options.insert(key.into(), value);
        self
    }

    pub const fn stream(mut self, stream: bool) -> Self {
        self.config.stream = stream;
        self
    }

    /// Set how long to keep the model loaded (e.g. "5m", "1h")
    pub fn keep_alive<S: Into<String>>(mut self, duration: S) -> Self {
        self.config.keep_alive = Some(duration.into());
        self
    }

    pub const fn think(mut self, think: bool) -> Self {
        self.config.think = think;
        self
    }

    pub const fn thinking_budget(mut self, budget: u32) -> Self {
        self.config.thinking_budget = budget;
        self
    }

    pub fn markers(mut self, markers: StructuredOutputMarkers) -> Self {
        self.config.markers = markers;
        self
    }

    pub const fn prompt_selection(mut self, selection: PromptSelection) -> Self {
        self.config.prompt_selection = selection;
        self
    }

    pub fn build(self) -> Result<OllamaConfig, LlmError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
