//! Tunable parameters for the affect model.
//!
//! These values correspond to the `affect` section of
//! `society-config.yaml`. Every field has a default, so a partial YAML
//! section only overrides what it names.

use serde::Deserialize;

/// Configuration for an agent's [`AffectEngine`](crate::affect::AffectEngine).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AffectConfig {
    /// Fraction of the gap between current state and baseline closed per
    /// second of elapsed time (default: 0.05).
    pub decay_rate: f64,

    /// Resistance of the mood baseline to change, in `[0, 1]` (default: 0.9).
    ///
    /// At 1.0 the baseline never moves; at 0.0 it tracks the current state
    /// as fast as the current state decays.
    pub mood_inertia: f64,

    /// Fraction of the elapsed decay step by which the baseline is also
    /// pulled back toward the personality bias (default: 0.1).
    pub bias_pull: f64,

    /// Scale applied to the PAD shift caused by appraised emotions
    /// (default: 0.4).
    pub reactivity: f64,

    /// Maximum number of simultaneously active discrete emotions
    /// (default: 5).
    pub max_emotions: usize,

    /// Emotions weaker than this are pruned (default: 0.05).
    pub min_intensity: f64,

    /// Lifetime given to newly appraised emotions, in seconds
    /// (default: 300).
    pub emotion_duration_secs: u64,

    /// Mood label boundaries.
    pub mood_thresholds: MoodThresholds,

    /// Appraisal rule boundaries.
    pub appraisal_thresholds: AppraisalThresholds,
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.05,
            mood_inertia: 0.9,
            bias_pull: 0.1,
            reactivity: 0.4,
            max_emotions: 5,
            min_intensity: 0.05,
            emotion_duration_secs: 300,
            mood_thresholds: MoodThresholds::default(),
            appraisal_thresholds: AppraisalThresholds::default(),
        }
    }
}

/// Boundaries used to map a mood baseline to a [`MoodLabel`].
///
/// All comparisons are strict, so a value exactly on a boundary falls on
/// the neutral side of it.
///
/// [`MoodLabel`]: society_types::MoodLabel
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MoodThresholds {
    /// Pleasure beyond +/- this is "pleasant" / "unpleasant" (default: 0.3).
    pub pleasure: f64,
    /// Arousal beyond +/- this is "aroused" / "subdued" (default: 0.3).
    pub arousal: f64,
    /// Dominance above this turns distress into anger (default: 0.3).
    pub dominance: f64,
    /// Pleasure above this is "happy" rather than "content" (default: 0.6).
    pub strong_pleasure: f64,
}

impl Default for MoodThresholds {
    fn default() -> Self {
        Self {
            pleasure: 0.3,
            arousal: 0.3,
            dominance: 0.3,
            strong_pleasure: 0.6,
        }
    }
}

/// Boundaries used by the appraisal rule table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppraisalThresholds {
    /// A "strong" axis value (default: 0.6).
    pub high: f64,
    /// A "noticeable" axis value (default: 0.3).
    pub mid: f64,
    /// Novelty at or below this counts as familiar (default: 0.3).
    pub low: f64,
}

impl Default for AppraisalThresholds {
    fn default() -> Self {
        Self {
            high: 0.6,
            mid: 0.3,
            low: 0.3,
        }
    }
}
