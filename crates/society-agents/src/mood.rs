//! Mood labels and mood influence.
//!
//! Both are pure functions of a PAD point: [`mood_label`] reads the slow
//! mood baseline, [`mood_influence`] reads the fast current state.

use society_types::{MoodInfluence, MoodLabel, Pad};

use crate::config::MoodThresholds;

/// Map a mood baseline to a coarse label.
///
/// Comparisons are strict, so values exactly on a threshold resolve to the
/// calmer side and, at the origin of every axis, to [`MoodLabel::Neutral`].
pub fn mood_label(baseline: Pad, t: &MoodThresholds) -> MoodLabel {
    let Pad {
        pleasure: p,
        arousal: a,
        dominance: d,
    } = baseline;

    if p > t.pleasure {
        if a > t.arousal {
            MoodLabel::Excited
        } else if a < -t.arousal {
            MoodLabel::Calm
        } else if p > t.strong_pleasure {
            MoodLabel::Happy
        } else {
            MoodLabel::Content
        }
    } else if p < -t.pleasure {
        if a > t.arousal {
            if d > t.dominance {
                MoodLabel::Angry
            } else {
                MoodLabel::Anxious
            }
        } else {
            MoodLabel::Sad
        }
    } else if a < -t.arousal {
        MoodLabel::Bored
    } else {
        MoodLabel::Neutral
    }
}

/// Derive behavioral tendencies from the current affect state.
///
/// Each output is a convex combination of PAD axes, so it stays inside
/// `[-1, 1]` whenever the input does.
pub fn mood_influence(current: Pad) -> MoodInfluence {
    let Pad {
        pleasure: p,
        arousal: a,
        dominance: d,
    } = current;

    MoodInfluence {
        impulsivity: clamp(a.mul_add(0.8, p * 0.2)),
        sociability: clamp(p.mul_add(0.7, d * 0.3)),
        risk_aversion: clamp(p.mul_add(-0.7, d * -0.3)),
        assertiveness: clamp(d.mul_add(0.8, a * 0.2)),
    }
}

fn clamp(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}
