//! Per-agent minds: a [`Brain`] paired with an [`AffectEngine`].
//!
//! The scheduler owns one mind per agent, created lazily from the stored
//! record the first time the agent is selected. A mind's affect state and
//! thought buffer are only mutated by that agent's own turns.
//!
//! Each mind's live-thought stream is forwarded to the hub as `thought`
//! events by a small task that ends when the mind is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use society_agents::{AffectConfig, AffectEngine, Stimulus};
use society_runner::{
    Brain, BrainConfig, ChatMessage, Feeling, GatewayError, InferenceGateway, PromptEngine,
};
use society_types::{
    AgentId, AgentRecord, EmotionKind, Goal, MoodSnapshot, ObserverEvent, RecordError, Thought,
    ThoughtEvent,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::hub::Hub;

/// How many of the strongest emotions a prompt mentions.
pub const PROMPT_EMOTIONS: usize = 3;

/// One agent's cognitive state.
pub struct AgentMind {
    agent_id: AgentId,
    name: String,
    goals: Vec<Goal>,
    brain: Brain,
    affect: Mutex<AffectEngine>,
    last_update: Mutex<Instant>,
}

impl AgentMind {
    /// The agent this mind belongs to.
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Display name used in prompts and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying brain.
    pub const fn brain(&self) -> &Brain {
        &self.brain
    }

    /// Advance the affect state by the wall time since the last update and
    /// return what the agent now feels.
    pub fn settle(&self) -> Feeling {
        let elapsed = {
            let mut last = self
                .last_update
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let elapsed = now.saturating_duration_since(*last);
            *last = now;
            elapsed
        };
        let mut affect = self.affect.lock().unwrap_or_else(PoisonError::into_inner);
        affect.update(elapsed);
        Feeling {
            mood: affect.mood_label(),
            influence: affect.mood_influence(),
            emotions: affect
                .dominant_emotions(PROMPT_EMOTIONS)
                .into_iter()
                .map(|e| e.kind)
                .collect(),
        }
    }

    /// Appraise a stimulus. Returns the triggered emotions.
    pub fn appraise(&self, stimulus: &Stimulus) -> Vec<EmotionKind> {
        self.affect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .appraise(stimulus)
    }

    /// Current mood for persistence.
    pub fn snapshot(&self) -> MoodSnapshot {
        self.affect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Settle the affect state, then run one cognitive cycle over `history`.
    pub async fn respond(
        &self,
        cancel: &CancellationToken,
        history: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let feeling = self.settle();
        self.brain
            .think(cancel, &self.name, &feeling, &self.goals, history)
            .await
    }
}

/// Lazily-populated set of minds shared by every conversation.
pub struct MindRegistry {
    gateway: Arc<InferenceGateway>,
    prompts: Arc<PromptEngine>,
    hub: Arc<Hub>,
    brain_config: BrainConfig,
    affect_config: AffectConfig,
    minds: Mutex<HashMap<AgentId, Arc<AgentMind>>>,
}

impl MindRegistry {
    /// Create an empty registry.
    pub fn new(
        gateway: Arc<InferenceGateway>,
        prompts: Arc<PromptEngine>,
        hub: Arc<Hub>,
        brain_config: BrainConfig,
        affect_config: AffectConfig,
    ) -> Self {
        Self {
            gateway,
            prompts,
            hub,
            brain_config,
            affect_config,
            minds: Mutex::new(HashMap::new()),
        }
    }

    /// Return the mind for `record`, building it on first use.
    ///
    /// Must be called from within a Tokio runtime: building a mind spawns
    /// its thought forwarder.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] if the record's documents cannot be
    /// decoded.
    pub fn mind_for(&self, record: &AgentRecord) -> Result<Arc<AgentMind>, RecordError> {
        let mut minds = self.minds.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mind) = minds.get(&record.id) {
            return Ok(Arc::clone(mind));
        }

        let personality = record.personality()?;
        let mood = record.stored_mood()?;
        let goals = record.goals()?;

        let (brain, thoughts) = Brain::new(
            record.id,
            personality.clone(),
            Arc::clone(&self.gateway),
            Arc::clone(&self.prompts),
            &self.brain_config,
        );
        let mind = Arc::new(AgentMind {
            agent_id: record.id,
            name: record.name.clone(),
            goals,
            brain,
            affect: Mutex::new(match mood {
                Some(mood) => {
                    AffectEngine::from_snapshot(personality, self.affect_config.clone(), &mood)
                }
                None => AffectEngine::new(personality, self.affect_config.clone()),
            }),
            last_update: Mutex::new(Instant::now()),
        });

        tokio::spawn(forward_thoughts(
            Arc::clone(&self.hub),
            record.id,
            record.name.clone(),
            thoughts,
        ));
        debug!(agent_id = %record.id, name = %record.name, "mind created");

        minds.insert(record.id, Arc::clone(&mind));
        Ok(mind)
    }

    /// Drop the mind for an agent, if one exists.
    pub fn forget(&self, agent_id: AgentId) -> bool {
        self.minds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&agent_id)
            .is_some()
    }

    /// Number of minds built so far.
    pub fn len(&self) -> usize {
        self.minds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no mind has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn forward_thoughts(
    hub: Arc<Hub>,
    agent_id: AgentId,
    agent_name: String,
    mut thoughts: mpsc::Receiver<Thought>,
) {
    while let Some(thought) = thoughts.recv().await {
        let delivered = hub.broadcast(&ObserverEvent::Thought(ThoughtEvent {
            agent_id,
            agent_name: agent_name.clone(),
            content: thought.content,
            thought_type: thought.thought_type,
            timestamp: thought.timestamp,
        }));
        trace!(agent_id = %agent_id, delivered, "thought forwarded");
    }
}
