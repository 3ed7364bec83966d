//! Enumeration types shared across the society crates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// Coarse mood label derived from an agent's mood baseline.
///
/// The label is what the agent "feels" in its prompt. It is recomputed from
/// the continuous affect state on every cognitive cycle and never stored
/// independently of that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MoodLabel {
    /// Strongly pleasant, moderate arousal.
    Happy,
    /// Unpleasant and low energy.
    Sad,
    /// Unpleasant, aroused, and not in control.
    Anxious,
    /// Pleasant and relaxed.
    Calm,
    /// Unpleasant, aroused, and dominant.
    Angry,
    /// Pleasant and highly aroused.
    Excited,
    /// Flat pleasure, low arousal.
    Bored,
    /// Mildly pleasant.
    Content,
    /// No pronounced mood.
    Neutral,
}

impl MoodLabel {
    /// Lowercase name used in prompts and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Anxious => "anxious",
            Self::Calm => "calm",
            Self::Angry => "angry",
            Self::Excited => "excited",
            Self::Bored => "bored",
            Self::Content => "content",
            Self::Neutral => "neutral",
        }
    }
}

impl core::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Discrete emotions
// ---------------------------------------------------------------------------

/// A discrete, named emotion produced by appraisal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EmotionKind {
    /// Pleasure at a goal-congruent outcome.
    Joy,
    /// Distress at a loss nobody is to blame for.
    Sadness,
    /// Displeasure at someone else's blameworthy act.
    Anger,
    /// Anticipated harm from something unexpected.
    Fear,
    /// Reaction to a strongly unexpected event.
    Surprise,
    /// Rejection of something that violates a norm.
    Disgust,
    /// Confidence in a familiar other.
    Trust,
    /// Expectation of something relevant but undecided.
    Anticipation,
    /// Felt absence of social contact.
    Loneliness,
    /// Approval of one's own praiseworthy act.
    Pride,
    /// Disapproval of one's own blameworthy act.
    Shame,
}

impl EmotionKind {
    /// Lowercase name used in logs and thought records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Trust => "trust",
            Self::Anticipation => "anticipation",
            Self::Loneliness => "loneliness",
            Self::Pride => "pride",
            Self::Shame => "shame",
        }
    }
}

// ---------------------------------------------------------------------------
// Thoughts
// ---------------------------------------------------------------------------

/// Category of a recorded thought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ThoughtType {
    /// Something the agent noticed.
    Observation,
    /// Intermediate reasoning.
    Reasoning,
    /// A committed reply or choice.
    Decision,
    /// An affective reaction.
    Emotion,
    /// Looking back on past events.
    Reflection,
    /// A recalled memory.
    Memory,
}

impl ThoughtType {
    /// Lowercase name used on the observer stream.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::Reasoning => "reasoning",
            Self::Decision => "decision",
            Self::Emotion => "emotion",
            Self::Reflection => "reflection",
            Self::Memory => "memory",
        }
    }
}
