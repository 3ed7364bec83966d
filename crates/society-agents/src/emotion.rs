//! Discrete emotions and their PAD directions.

use chrono::{DateTime, TimeDelta, Utc};
use society_types::{EmotionKind, Pad};

/// The direction in PAD space each emotion pushes the current state.
///
/// Values follow the usual Mehrabian placements, scaled to unit range.
pub fn pad_direction(kind: EmotionKind) -> Pad {
    let (p, a, d) = match kind {
        EmotionKind::Joy => (0.8, 0.5, 0.4),
        EmotionKind::Sadness => (-0.6, -0.4, -0.3),
        EmotionKind::Anger => (-0.5, 0.6, 0.3),
        EmotionKind::Fear => (-0.6, 0.6, -0.4),
        EmotionKind::Surprise => (0.1, 0.7, 0.0),
        EmotionKind::Disgust => (-0.6, 0.3, 0.2),
        EmotionKind::Trust => (0.5, -0.2, 0.1),
        EmotionKind::Anticipation => (0.3, 0.5, 0.2),
        EmotionKind::Loneliness => (-0.5, -0.3, -0.4),
        EmotionKind::Pride => (0.6, 0.3, 0.6),
        EmotionKind::Shame => (-0.5, 0.2, -0.6),
    };
    Pad::new(p, a, d)
}

/// An active emotion with an intensity and a lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteEmotion {
    /// Which emotion.
    pub kind: EmotionKind,
    /// Strength in `[0.0, 1.0]`.
    pub intensity: f64,
    /// Description of what caused it.
    pub trigger: String,
    /// When it started.
    pub started_at: DateTime<Utc>,
    /// How long it is expected to last.
    pub duration: TimeDelta,
}

impl DiscreteEmotion {
    /// Create an emotion starting at `started_at`.
    pub fn new(
        kind: EmotionKind,
        intensity: f64,
        trigger: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: TimeDelta,
    ) -> Self {
        Self {
            kind,
            intensity: if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) },
            trigger: trigger.into(),
            started_at,
            duration,
        }
    }

    /// Whether the emotion has outlived its duration at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.started_at
            .checked_add_signed(self.duration)
            .is_some_and(|end| now >= end)
    }
}
