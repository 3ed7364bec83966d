//! Inference gateway and cognitive cycle for the agent society.
//!
//! The gateway is the single point through which every agent reaches the
//! language-model backend. It bounds concurrency with a semaphore and makes
//! every call both time-bounded and cancellable. The [`Brain`] sits on top
//! and turns an agent's personality, mood, goals, and transcript into one
//! reply.
//!
//! # Modules
//!
//! - [`brain`] -- Cognitive cycle and thought recording
//! - [`config`] -- Gateway configuration and environment overrides
//! - [`error`] -- [`GatewayError`]
//! - [`gateway`] -- [`InferenceGateway`]: admission, timeout, cancellation, retry
//! - [`llm`] -- Ollama and `OpenAI`-compatible backends
//! - [`prompt`] -- `minijinja` prompt templates

pub mod brain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod prompt;

pub use brain::{Brain, BrainConfig, temperature_for};
pub use config::{BackendType, GatewayConfig};
pub use error::GatewayError;
pub use gateway::InferenceGateway;
pub use llm::{ChatMessage, ChatRole, CompletionRequest, CompletionResponse, LlmBackend, create_backend};
pub use prompt::{Feeling, PromptEngine};
