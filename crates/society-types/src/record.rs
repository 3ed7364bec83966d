//! Agent records and their versioned JSON documents.
//!
//! Storage keeps the personality, mood, and goals of an agent as JSON
//! documents. Each document is wrapped in an envelope carrying a schema
//! version:
//!
//! ```json
//! { "version": 1, "data": { ... } }
//! ```
//!
//! Decoding is always explicit and returns a [`RecordError`] for malformed
//! input. Documents written before the envelope existed (a bare object or
//! array) are accepted as version 0.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::AgentId;
use crate::structs::{Goal, MoodSnapshot, Personality};

/// Current envelope version written by [`encode_document`].
pub const DOCUMENT_VERSION: u32 = 1;

/// Errors raised while decoding a stored agent document.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The document body did not match the expected shape.
    #[error("malformed {field} document: {source}")]
    Malformed {
        /// Which document failed (`personality`, `mood`, or `goals`).
        field: &'static str,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The envelope version is newer than this build understands.
    #[error("unsupported {field} document version {version}")]
    UnsupportedVersion {
        /// Which document failed.
        field: &'static str,
        /// The version found in storage.
        version: u32,
    },

    /// Encoding a document failed.
    #[error("failed to encode {field} document: {source}")]
    Encode {
        /// Which document failed.
        field: &'static str,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    data: serde_json::Value,
}

/// Wrap `value` in a versioned envelope.
pub fn encode_document<T: Serialize>(
    field: &'static str,
    value: &T,
) -> Result<serde_json::Value, RecordError> {
    serde_json::to_value(EnvelopeRef {
        version: DOCUMENT_VERSION,
        data: value,
    })
    .map_err(|source| RecordError::Encode { field, source })
}

/// Decode a versioned (or legacy bare) document.
pub fn decode_document<T: DeserializeOwned>(
    field: &'static str,
    document: &serde_json::Value,
) -> Result<T, RecordError> {
    let is_envelope = document
        .as_object()
        .is_some_and(|o| o.contains_key("version") && o.contains_key("data"));

    if !is_envelope {
        return serde_json::from_value(document.clone())
            .map_err(|source| RecordError::Malformed { field, source });
    }

    let envelope: Envelope = serde_json::from_value(document.clone())
        .map_err(|source| RecordError::Malformed { field, source })?;
    if envelope.version > DOCUMENT_VERSION {
        return Err(RecordError::UnsupportedVersion {
            field,
            version: envelope.version,
        });
    }
    serde_json::from_value(envelope.data).map_err(|source| RecordError::Malformed { field, source })
}

/// A stored agent as the repository sees it.
///
/// Documents stay as raw JSON here; call [`AgentRecord::personality`],
/// [`AgentRecord::mood`], or [`AgentRecord::goals`] to decode them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentRecord {
    /// Unique agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Versioned personality document.
    pub personality: serde_json::Value,
    /// Versioned mood document, if a mood has been saved.
    pub mood: Option<serde_json::Value>,
    /// Versioned goals document, if goals were assigned.
    pub goals: Option<serde_json::Value>,
    /// Whether the agent takes part in conversations.
    pub active: bool,
    /// When the agent was created.
    pub created_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Create an active record for a new agent.
    pub fn new(name: impl Into<String>, personality: &Personality) -> Result<Self, RecordError> {
        Ok(Self {
            id: AgentId::new(),
            name: name.into(),
            personality: encode_document("personality", personality)?,
            mood: None,
            goals: None,
            active: true,
            created_at: Utc::now(),
        })
    }

    /// Attach goals to the record.
    pub fn with_goals(mut self, goals: &[Goal]) -> Result<Self, RecordError> {
        self.goals = Some(encode_document("goals", &goals)?);
        Ok(self)
    }

    /// Decode the personality document. Trait values are clamped.
    pub fn personality(&self) -> Result<Personality, RecordError> {
        decode_document::<Personality>("personality", &self.personality).map(Personality::clamped)
    }

    /// Decode the mood document, or a neutral snapshot if none is stored.
    pub fn mood(&self) -> Result<MoodSnapshot, RecordError> {
        self.stored_mood()
            .map(|mood| mood.unwrap_or_else(MoodSnapshot::neutral))
    }

    /// Decode the mood document if one has been saved.
    ///
    /// `None` means the agent has never had a turn.
    pub fn stored_mood(&self) -> Result<Option<MoodSnapshot>, RecordError> {
        self.mood
            .as_ref()
            .map(|doc| decode_document("mood", doc))
            .transpose()
    }

    /// Decode the goals document, or an empty list if none is stored.
    pub fn goals(&self) -> Result<Vec<Goal>, RecordError> {
        self.goals
            .as_ref()
            .map_or_else(|| Ok(Vec::new()), |doc| decode_document("goals", doc))
    }
}
