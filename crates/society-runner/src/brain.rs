//! The cognitive cycle: turn an agent's context into one reply.
//!
//! A [`Brain`] is the only path by which an agent's personality, feeling,
//! and goals reach the inference backend. Each call to [`Brain::think`]
//! renders a system prompt, shapes the temperature from openness, runs one
//! gateway call, and records the reply as a `Decision` thought.
//!
//! Recorded thoughts land in a bounded [`ThoughtBuffer`] and are offered to
//! a live-thought stream with `try_send`. A full or closed stream drops the
//! thought; the cycle itself never waits on a consumer.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use society_agents::ThoughtBuffer;
use society_types::{AgentId, Goal, Personality, Thought, ThoughtType};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::GatewayError;
use crate::gateway::InferenceGateway;
use crate::llm::{ChatMessage, CompletionRequest};
use crate::prompt::{Feeling, PromptEngine};

/// Per-agent working-memory settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Capacity of the working-thought buffer.
    pub max_thoughts: usize,
    /// Capacity of the live-thought stream.
    pub thought_stream_capacity: usize,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            max_thoughts: 20,
            thought_stream_capacity: 16,
        }
    }
}

/// Temperature for an agent: `0.5 + openness * 0.5`.
pub fn temperature_for(personality: &Personality) -> f64 {
    personality.openness.clamp(0.0, 1.0).mul_add(0.5, 0.5)
}

/// One agent's cognitive-cycle builder.
pub struct Brain {
    agent_id: AgentId,
    personality: Personality,
    gateway: Arc<InferenceGateway>,
    prompts: Arc<PromptEngine>,
    thoughts: Mutex<ThoughtBuffer>,
    stream: mpsc::Sender<Thought>,
}

impl Brain {
    /// Create a brain and the receiving end of its live-thought stream.
    pub fn new(
        agent_id: AgentId,
        personality: Personality,
        gateway: Arc<InferenceGateway>,
        prompts: Arc<PromptEngine>,
        config: &BrainConfig,
    ) -> (Self, mpsc::Receiver<Thought>) {
        let (tx, rx) = mpsc::channel(config.thought_stream_capacity.max(1));
        let brain = Self {
            agent_id,
            personality,
            gateway,
            prompts,
            thoughts: Mutex::new(ThoughtBuffer::new(config.max_thoughts)),
            stream: tx,
        };
        (brain, rx)
    }

    /// The agent this brain belongs to.
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// The personality the prompt is built from.
    pub const fn personality(&self) -> &Personality {
        &self.personality
    }

    /// Sampling temperature used for every call.
    pub fn temperature(&self) -> f64 {
        temperature_for(&self.personality)
    }

    /// Run one cognitive cycle and return the trimmed reply.
    ///
    /// On error the thought buffer and stream are left untouched and the
    /// gateway error is returned as-is.
    pub async fn think(
        &self,
        cancel: &CancellationToken,
        name: &str,
        feeling: &Feeling,
        goals: &[Goal],
        history: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let system_prompt = self
            .prompts
            .system_prompt(name, &self.personality, feeling, goals)?;

        let request = CompletionRequest {
            system_prompt,
            messages: history.to_vec(),
            temperature: Some(self.temperature()),
            max_tokens: None,
        };

        let response = self.gateway.complete(cancel, request).await?;
        let reply = response.content.trim().to_owned();

        self.record(Thought::new(
            reply.clone(),
            ThoughtType::Decision,
            vec![format!("conversation:{}", history.len())],
        ));

        debug!(
            agent_id = %self.agent_id,
            mood = %feeling.mood,
            reply_len = reply.len(),
            "cognitive cycle completed"
        );
        Ok(reply)
    }

    fn record(&self, thought: Thought) {
        let streamed = thought.clone();
        self.thoughts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(thought);

        if let Err(e) = self.stream.try_send(streamed) {
            trace!(agent_id = %self.agent_id, error = %e, "live thought dropped");
        }
    }

    /// The working-thought buffer, oldest first.
    pub fn recent_thoughts(&self) -> Vec<Thought> {
        self.thoughts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }
}
