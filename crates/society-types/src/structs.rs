//! Core data structures: personality, affect snapshots, goals, thoughts,
//! and conversation turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{MoodLabel, ThoughtType};
use crate::ids::{AgentId, GoalId, TurnId};

/// Current schema version of serialized mood snapshots.
pub const MOOD_SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Big Five personality profile of an agent.
///
/// Set once at agent creation and never mutated afterwards. It is the only
/// input to prompt-tone selection and to the resting point of the affect
/// model. Trait values are normalized to `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Personality {
    /// Curiosity and appetite for novelty.
    pub openness: f64,
    /// Organization and dependability.
    pub conscientiousness: f64,
    /// Sociability and talkativeness.
    pub extraversion: f64,
    /// Warmth and cooperativeness.
    pub agreeableness: f64,
    /// Emotional sensitivity.
    pub neuroticism: f64,
    /// Values the agent holds, most important first.
    #[serde(default)]
    pub core_values: Vec<String>,
    /// Behavioral quirks, in the order they should be mentioned.
    #[serde(default)]
    pub quirks: Vec<String>,
}

impl Personality {
    /// Build a personality from the five trait values, clamping each into
    /// `[0.0, 1.0]`.
    pub fn new(
        openness: f64,
        conscientiousness: f64,
        extraversion: f64,
        agreeableness: f64,
        neuroticism: f64,
    ) -> Self {
        Self {
            openness: unit(openness),
            conscientiousness: unit(conscientiousness),
            extraversion: unit(extraversion),
            agreeableness: unit(agreeableness),
            neuroticism: unit(neuroticism),
            core_values: Vec::new(),
            quirks: Vec::new(),
        }
    }

    /// Attach core values.
    #[must_use]
    pub fn with_core_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Attach behavioral quirks.
    #[must_use]
    pub fn with_quirks<I, S>(mut self, quirks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quirks = quirks.into_iter().map(Into::into).collect();
        self
    }

    /// Return a copy with every trait clamped into `[0.0, 1.0]`.
    ///
    /// Applied to personalities decoded from storage or received over the
    /// API, where nothing guarantees the range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.openness = unit(self.openness);
        self.conscientiousness = unit(self.conscientiousness);
        self.extraversion = unit(self.extraversion);
        self.agreeableness = unit(self.agreeableness);
        self.neuroticism = unit(self.neuroticism);
        self
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5)
    }
}

/// Clamp into `[0, 1]`, mapping NaN to the midpoint.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Affect snapshots
// ---------------------------------------------------------------------------

/// A point in Pleasure-Arousal-Dominance space.
///
/// Every constructor and arithmetic helper clamps its output to
/// `[-1.0, 1.0]` on each axis, so a `Pad` value is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Pad {
    /// Pleasure (valence).
    pub pleasure: f64,
    /// Arousal (activation).
    pub arousal: f64,
    /// Dominance (sense of control).
    pub dominance: f64,
}

impl Pad {
    /// The neutral origin.
    pub const NEUTRAL: Self = Self {
        pleasure: 0.0,
        arousal: 0.0,
        dominance: 0.0,
    };

    /// Create a PAD point, clamping each axis.
    pub fn new(pleasure: f64, arousal: f64, dominance: f64) -> Self {
        Self {
            pleasure: signed_unit(pleasure),
            arousal: signed_unit(arousal),
            dominance: signed_unit(dominance),
        }
    }

    /// Move a fraction `t` (clamped to `[0, 1]`) of the way toward `target`.
    #[must_use]
    pub fn lerp(self, target: Self, t: f64) -> Self {
        let t = unit_or_zero(t);
        Self::new(
            (target.pleasure - self.pleasure).mul_add(t, self.pleasure),
            (target.arousal - self.arousal).mul_add(t, self.arousal),
            (target.dominance - self.dominance).mul_add(t, self.dominance),
        )
    }

    /// Add `direction` scaled by `weight`, clamping the result.
    #[must_use]
    pub fn shifted(self, direction: Self, weight: f64) -> Self {
        Self::new(
            direction.pleasure.mul_add(weight, self.pleasure),
            direction.arousal.mul_add(weight, self.arousal),
            direction.dominance.mul_add(weight, self.dominance),
        )
    }

    /// Whether every axis lies within `[-1, 1]`.
    pub fn in_range(self) -> bool {
        [self.pleasure, self.arousal, self.dominance]
            .iter()
            .all(|v| (-1.0..=1.0).contains(v))
    }
}

/// Clamp into `[-1, 1]`, mapping NaN to zero.
fn signed_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

fn unit_or_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Behavioral tendencies derived from the current affect state.
///
/// Each field is in `[-1.0, 1.0]`; positive means "more of it".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoodInfluence {
    /// Tendency to act without deliberating.
    pub impulsivity: f64,
    /// Tendency to seek out others.
    pub sociability: f64,
    /// Tendency to avoid uncertain outcomes.
    pub risk_aversion: f64,
    /// Tendency to push one's own view.
    pub assertiveness: f64,
}

/// Versioned mood document stored on the agent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoodSnapshot {
    /// Schema version ([`MOOD_SNAPSHOT_VERSION`] when written by this build).
    pub version: u32,
    /// Fast-reacting affect state.
    pub current: Pad,
    /// Slow-moving mood baseline.
    pub baseline: Pad,
    /// Mood label derived from the baseline.
    pub label: MoodLabel,
    /// Behavioral influence derived from the current state.
    pub influence: MoodInfluence,
}

impl MoodSnapshot {
    /// A neutral snapshot, used for agents that have no stored mood yet.
    pub const fn neutral() -> Self {
        Self {
            version: MOOD_SNAPSHOT_VERSION,
            current: Pad::NEUTRAL,
            baseline: Pad::NEUTRAL,
            label: MoodLabel::Neutral,
            influence: MoodInfluence {
                impulsivity: 0.0,
                sociability: 0.0,
                risk_aversion: 0.0,
                assertiveness: 0.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Goals and thoughts
// ---------------------------------------------------------------------------

/// Something an agent is working toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Goal {
    /// Unique goal identifier.
    pub id: GoalId,
    /// Free-text description shown to the model.
    pub description: String,
    /// Priority in `[0.0, 1.0]`; higher goals are listed first.
    pub priority: f64,
    /// Progress in `[0.0, 1.0]`.
    pub progress: f64,
    /// Whether the goal has been achieved.
    pub completed: bool,
    /// When the goal was created.
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Create an open goal with zero progress.
    pub fn new(description: impl Into<String>, priority: f64) -> Self {
        Self {
            id: GoalId::new(),
            description: description.into(),
            priority: unit(priority),
            progress: 0.0,
            completed: false,
            created_at: Utc::now(),
        }
    }
}

/// One recorded output of a cognitive cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Thought {
    /// The thought text.
    pub content: String,
    /// What kind of thought this is.
    pub thought_type: ThoughtType,
    /// References to whatever prompted the thought.
    pub triggers: Vec<String>,
    /// When the thought was produced.
    pub timestamp: DateTime<Utc>,
}

impl Thought {
    /// Create a thought stamped with the current time.
    pub fn new(content: impl Into<String>, thought_type: ThoughtType, triggers: Vec<String>) -> Self {
        Self {
            content: content.into(),
            thought_type,
            triggers,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation turns
// ---------------------------------------------------------------------------

/// A single utterance from one agent to another.
///
/// Immutable once produced. The scheduler persists it and broadcasts it to
/// observers; both are best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConversationTurn {
    /// Unique turn identifier.
    pub id: TurnId,
    /// The agent that spoke.
    pub speaker_id: AgentId,
    /// The agent being addressed.
    pub target_id: AgentId,
    /// What was said.
    pub content: String,
    /// Tick of the conversation this turn belongs to.
    pub tick: u64,
    /// When the turn was produced.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(speaker_id: AgentId, target_id: AgentId, content: impl Into<String>, tick: u64) -> Self {
        Self {
            id: TurnId::new(),
            speaker_id,
            target_id,
            content: content.into(),
            tick,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personality_traits_are_clamped() {
        let p = Personality::new(1.4, -0.2, 0.5, f64::NAN, 0.9);
        assert!((p.openness - 1.0).abs() < f64::EPSILON);
        assert!(p.conscientiousness.abs() < f64::EPSILON);
        assert!((p.agreeableness - 0.5).abs() < f64::EPSILON);
        assert!((p.neuroticism - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn pad_constructor_clamps() {
        let pad = Pad::new(3.0, -7.0, 0.25);
        assert!(pad.in_range());
        assert!((pad.pleasure - 1.0).abs() < f64::EPSILON);
        assert!((pad.arousal + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lerp_moves_partway_and_clamps_t() {
        let from = Pad::NEUTRAL;
        let to = Pad::new(1.0, -1.0, 0.5);
        let half = from.lerp(to, 0.5);
        assert!((half.pleasure - 0.5).abs() < 1e-9);
        assert!((half.arousal + 0.5).abs() < 1e-9);

        let overshoot = from.lerp(to, 4.0);
        assert!((overshoot.pleasure - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shifted_never_leaves_range() {
        let pad = Pad::new(0.9, 0.9, 0.9).shifted(Pad::new(1.0, 1.0, 1.0), 5.0);
        assert!(pad.in_range());
    }

    #[test]
    fn neutral_snapshot_is_current_version() {
        let snapshot = MoodSnapshot::neutral();
        assert_eq!(snapshot.version, MOOD_SNAPSHOT_VERSION);
        assert_eq!(snapshot.label, MoodLabel::Neutral);
    }
}
