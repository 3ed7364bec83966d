//! Inference backend abstraction and implementations.
//!
//! Backends are dispatched through an enum instead of trait objects, since
//! async methods are not dyn-compatible. Two wire formats are supported:
//! Ollama's native chat API and the `OpenAI`-compatible chat completions
//! API. Both speak JSON over HTTP via `reqwest`.
//!
//! Backends do no retrying, timing, or admission control; the
//! [`InferenceGateway`](crate::gateway::InferenceGateway) wraps them with
//! all three.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{BackendType, GatewayConfig};
use crate::error::GatewayError;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions framing the conversation.
    System,
    /// Input the agent is responding to.
    User,
    /// Something the agent itself said.
    Assistant,
}

/// One entry in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who the message is from.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// An `assistant` message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// A `system` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// A request to produce one reply.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    /// System prompt, sent ahead of the history.
    pub system_prompt: String,
    /// Conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Temperature override.
    pub temperature: Option<f64>,
    /// Reply-length override, in tokens.
    pub max_tokens: Option<u32>,
}

/// A reply from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Reply text.
    pub content: String,
    /// Model that produced it, as reported by the backend.
    pub model: String,
    /// Wall time of the successful attempt.
    pub duration: Duration,
}

/// A fully-shaped call handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct ChatCall<'a> {
    /// System prompt.
    pub system: &'a str,
    /// History.
    pub messages: &'a [ChatMessage],
    /// Effective temperature.
    pub temperature: f64,
    /// Effective reply-length bound.
    pub max_tokens: u32,
}

impl ChatCall<'_> {
    /// The system prompt followed by the history, as JSON message objects.
    fn wire_messages(&self) -> Vec<serde_json::Value> {
        let system = (!self.system.is_empty()).then(|| ChatMessage::system(self.system));
        system
            .iter()
            .chain(self.messages)
            .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
            .collect()
    }
}

/// Text and model name extracted from a backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    /// Reply text.
    pub content: String,
    /// Reported model.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Unified backend enum
// ---------------------------------------------------------------------------

/// An inference backend.
pub enum LlmBackend {
    /// Ollama native chat API.
    Ollama(OllamaBackend),
    /// `OpenAI`-compatible chat completions API.
    OpenAi(OpenAiBackend),
}

impl LlmBackend {
    /// Send one chat call and return the reply.
    pub async fn complete(&self, call: &ChatCall<'_>) -> Result<BackendReply, GatewayError> {
        match self {
            Self::Ollama(backend) => backend.complete(call).await,
            Self::OpenAi(backend) => backend.complete(call).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Ollama(_) => "ollama",
            Self::OpenAi(_) => "openai-compatible",
        }
    }
}

/// Map a `reqwest` send failure to a transport error.
fn transport(backend: &str, e: &reqwest::Error) -> GatewayError {
    GatewayError::Transport(format!("{backend} request failed: {e}"))
}

/// Turn a non-success response into a status error.
async fn status_error(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_owned());
    GatewayError::Status { status, body }
}

// ---------------------------------------------------------------------------
// Ollama backend
// ---------------------------------------------------------------------------

/// Backend for Ollama's `POST {api_url}/api/chat`.
pub struct OllamaBackend {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, call: &ChatCall<'_>) -> Result<BackendReply, GatewayError> {
        let url = format!("{}/api/chat", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": call.wire_messages(),
            "stream": false,
            "options": {
                "temperature": call.temperature,
                "num_predict": call.max_tokens,
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport("Ollama", &e))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("Ollama response parse failed: {e}")))?;

        let content = extract_ollama_content(&json)?;
        let model = json
            .get("model")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&self.model)
            .to_owned();
        Ok(BackendReply { content, model })
    }
}

/// Extract `message.content` from an Ollama chat response.
fn extract_ollama_content(json: &serde_json::Value) -> Result<String, GatewayError> {
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| GatewayError::Parse("Ollama response missing message.content".to_owned()))
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for `OpenAI`-compatible `POST {api_url}/chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, call: &ChatCall<'_>) -> Result<BackendReply, GatewayError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": call.wire_messages(),
            "temperature": call.temperature,
            "max_tokens": call.max_tokens,
        });

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport("OpenAI", &e))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("OpenAI response parse failed: {e}")))?;

        let content = extract_openai_content(&json)?;
        let model = json
            .get("model")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&self.model)
            .to_owned();
        Ok(BackendReply { content, model })
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, GatewayError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GatewayError::Parse("OpenAI response missing choices[0].message.content".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create a backend from configuration.
pub fn create_backend(config: &GatewayConfig) -> LlmBackend {
    match config.backend {
        BackendType::Ollama => LlmBackend::Ollama(OllamaBackend::new(config)),
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_ollama_content_valid() {
        let json = serde_json::json!({
            "model": "gemma3:4b",
            "message": {"role": "assistant", "content": "Hello, neighbour."},
            "done": true
        });
        let result = extract_ollama_content(&json);
        assert_eq!(result.ok().as_deref(), Some("Hello, neighbour."));
    }

    #[test]
    fn extract_ollama_content_missing() {
        let json = serde_json::json!({"error": "model not found"});
        assert!(matches!(extract_ollama_content(&json), Err(GatewayError::Parse(_))));
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Hi!"}}]
        });
        assert_eq!(extract_openai_content(&json).ok().as_deref(), Some("Hi!"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"choices": []});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn system_prompt_is_prepended() {
        let history = [ChatMessage::user("hello"), ChatMessage::assistant("hi")];
        let call = ChatCall {
            system: "You are Ada.",
            messages: &history,
            temperature: 0.7,
            max_tokens: 64,
        };
        let wire = call.wire_messages();
        assert_eq!(wire.len(), 3);
        assert_eq!(wire.first().map(|m| m["role"].clone()), Some("system".into()));
        assert_eq!(
            wire.first().map(|m| m["content"].clone()),
            Some("You are Ada.".into())
        );
        assert_eq!(wire.get(2).map(|m| m["role"].clone()), Some("assistant".into()));
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let history = [ChatMessage::user("hello")];
        let call = ChatCall {
            system: "",
            messages: &history,
            temperature: 0.7,
            max_tokens: 64,
        };
        assert_eq!(call.wire_messages().len(), 1);
    }

    #[test]
    fn create_backend_dispatches_correctly() {
        let ollama = create_backend(&GatewayConfig::default());
        assert_eq!(ollama.name(), "ollama");

        let openai = create_backend(&GatewayConfig {
            backend: BackendType::OpenAi,
            api_url: "https://api.openai.com/v1".to_owned(),
            ..GatewayConfig::default()
        });
        assert_eq!(openai.name(), "openai-compatible");
    }
}
