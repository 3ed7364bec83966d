//! Events pushed to real-time observers.
//!
//! Every event is a JSON object tagged by `type`. Field names are camelCase
//! because the dashboard consumes them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ThoughtType;
use crate::ids::AgentId;

/// An event delivered to every connected observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ObserverEvent {
    /// Sent once when an observer connects.
    Connected,
    /// A conversation turn was produced.
    Conversation(ConversationEvent),
    /// An agent recorded a thought.
    Thought(ThoughtEvent),
}

/// Payload of [`ObserverEvent::Conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ConversationEvent {
    /// Name of the agent that spoke.
    pub speaker_name: String,
    /// Name of the agent addressed.
    pub target_name: String,
    /// What was said.
    pub content: String,
    /// ID of the agent that spoke.
    pub agent_id: AgentId,
    /// Tick of the conversation.
    pub tick: u64,
}

/// Payload of [`ObserverEvent::Thought`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThoughtEvent {
    /// ID of the thinking agent.
    pub agent_id: AgentId,
    /// Name of the thinking agent.
    pub agent_name: String,
    /// The thought text.
    pub content: String,
    /// Kind of thought.
    pub thought_type: ThoughtType,
    /// When the thought was produced.
    pub timestamp: DateTime<Utc>,
}
