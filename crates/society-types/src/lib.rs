//! Shared type definitions for the agent society.
//!
//! Every crate in the workspace speaks in these types. Observer-facing types
//! also derive `ts-rs` so the dashboard gets matching `TypeScript` bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, goals, and turns
//! - [`enums`] -- Mood labels, discrete emotions, thought categories
//! - [`structs`] -- Personality, PAD points, goals, thoughts, turns
//! - [`record`] -- Stored agent records with versioned JSON documents
//! - [`events`] -- Events streamed to observers

pub mod enums;
pub mod events;
pub mod ids;
pub mod record;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EmotionKind, MoodLabel, ThoughtType};
pub use events::{ConversationEvent, ObserverEvent, ThoughtEvent};
pub use ids::{AgentId, GoalId, TurnId};
pub use record::{AgentRecord, DOCUMENT_VERSION, RecordError, decode_document, encode_document};
pub use structs::{
    ConversationTurn, Goal, MOOD_SNAPSHOT_VERSION, MoodInfluence, MoodSnapshot, Pad, Personality,
    Thought,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files under `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::GoalId::export_all();
        let _ = crate::ids::TurnId::export_all();

        let _ = crate::enums::MoodLabel::export_all();
        let _ = crate::enums::EmotionKind::export_all();
        let _ = crate::enums::ThoughtType::export_all();

        let _ = crate::structs::Personality::export_all();
        let _ = crate::structs::Pad::export_all();
        let _ = crate::structs::MoodInfluence::export_all();
        let _ = crate::structs::MoodSnapshot::export_all();
        let _ = crate::structs::Goal::export_all();
        let _ = crate::structs::Thought::export_all();
        let _ = crate::structs::ConversationTurn::export_all();

        let _ = crate::record::AgentRecord::export_all();

        let _ = crate::events::ObserverEvent::export_all();
        let _ = crate::events::ConversationEvent::export_all();
        let _ = crate::events::ThoughtEvent::export_all();
    }
}
