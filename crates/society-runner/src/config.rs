//! Configuration for the inference gateway.
//!
//! Lives under the `llm` key of `society-config.yaml`. Environment
//! variables override individual fields so deployments can point at a
//! different backend without editing the file:
//!
//! - `LLM_BACKEND` -- `ollama` or `openai`
//! - `OLLAMA_URL` -- backend base URL
//! - `OLLAMA_MODEL` -- model name
//! - `LLM_API_KEY` -- bearer token (OpenAI-compatible backends only)
//! - `MAX_CONCURRENT_CALLS` -- admission semaphore size
//! - `REQUEST_TIMEOUT_MS` -- per-attempt timeout

use std::time::Duration;

use serde::Deserialize;

use crate::error::GatewayError;

/// Supported inference backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Ollama's native `/api/chat` endpoint.
    Ollama,
    /// Any `OpenAI`-compatible `/chat/completions` endpoint.
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

impl BackendType {
    /// Parse a backend name as accepted in config and environment.
    pub fn parse(name: &str) -> Result<Self, GatewayError> {
        match name.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai-compatible" | "deepseek" | "vllm" => Ok(Self::OpenAi),
            other => Err(GatewayError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

/// Inference gateway settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Which wire format to speak.
    pub backend: BackendType,
    /// Base URL of the backend (e.g. `http://localhost:11434`).
    pub api_url: String,
    /// API key; empty for backends that need none.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Size of the admission semaphore.
    pub max_concurrent_calls: usize,
    /// Per-attempt timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Temperature used when a request does not override it.
    pub default_temperature: f64,
    /// Maximum reply tokens used when a request does not override it.
    pub max_tokens: u32,
    /// Extra attempts after a retryable failure (0 disables retry).
    pub max_retries: u32,
    /// Fixed delay between attempts, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::Ollama,
            api_url: "http://localhost:11434".to_owned(),
            api_key: String::new(),
            model: "gemma3:4b".to_owned(),
            max_concurrent_calls: 4,
            request_timeout_ms: 300_000,
            default_temperature: 0.7,
            max_tokens: 512,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl GatewayConfig {
    /// Per-attempt timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delay between retry attempts.
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), GatewayError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("LLM_BACKEND") {
            self.backend = BackendType::parse(&backend)?;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.api_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            self.api_key = key;
        }
        if let Some(raw) = lookup("MAX_CONCURRENT_CALLS") {
            self.max_concurrent_calls = raw
                .parse()
                .map_err(|e| GatewayError::Config(format!("invalid MAX_CONCURRENT_CALLS: {e}")))?;
        }
        if let Some(raw) = lookup("REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = raw
                .parse()
                .map_err(|e| GatewayError::Config(format!("invalid REQUEST_TIMEOUT_MS: {e}")))?;
        }
        Ok(())
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.api_url.trim().is_empty() {
            return Err(GatewayError::Config("api_url must not be empty".to_owned()));
        }
        if self.model.trim().is_empty() {
            return Err(GatewayError::Config("model must not be empty".to_owned()));
        }
        if self.max_concurrent_calls == 0 {
            return Err(GatewayError::Config(
                "max_concurrent_calls must be at least 1".to_owned(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(GatewayError::Config(
                "request_timeout_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
