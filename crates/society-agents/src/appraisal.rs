//! Stimulus appraisal and the emotion rule table.
//!
//! A [`Stimulus`] is evaluated along five axes (novelty, goal relevance,
//! goal congruence, agency, value-norm compatibility). The resulting
//! [`Appraisal`] is mapped through a fixed rule table to zero or more
//! discrete emotions with initial intensities.

use society_types::{EmotionKind, Personality};

use crate::config::AppraisalThresholds;

/// Who is responsible for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Agency {
    /// The agent itself.
    SelfCaused,
    /// Another agent or person.
    Other,
    /// Circumstance; nobody in particular.
    Situation,
}

/// Something that happened to an agent, described on the appraisal axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    /// Short description, kept as the trigger of any resulting emotion.
    pub description: String,
    /// How far the event deviates from expectation, `[0, 1]`.
    pub novelty: f64,
    /// How much the event matters to the agent's goals, `[0, 1]`.
    pub goal_relevance: f64,
    /// Whether the event helps (+) or hinders (-) those goals, `[-1, 1]`.
    pub goal_congruence: f64,
    /// Who caused it.
    pub agency: Agency,
    /// Compatibility with the agent's values, `[-1, 1]`.
    pub norm_compatibility: f64,
}

impl Stimulus {
    /// Another agent addressed this agent in conversation.
    pub fn social_contact(from: &str) -> Self {
        Self {
            description: format!("{from} spoke to me"),
            novelty: 0.2,
            goal_relevance: 0.5,
            goal_congruence: 0.35,
            agency: Agency::Other,
            norm_compatibility: 0.2,
        }
    }

    /// A human observer injected a message into the conversation.
    pub fn human_message() -> Self {
        Self {
            description: "a voice from outside the conversation".to_owned(),
            novelty: 0.8,
            goal_relevance: 0.65,
            goal_congruence: 0.1,
            agency: Agency::Other,
            norm_compatibility: 0.0,
        }
    }
}

/// The evaluated axes of a stimulus for one particular agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appraisal {
    /// Expectation deviation, `[0, 1]`.
    pub novelty: f64,
    /// Goal relevance, `[0, 1]`.
    pub relevance: f64,
    /// Goal congruence, `[-1, 1]`.
    pub congruence: f64,
    /// Responsibility.
    pub agency: Agency,
    /// Value-norm compatibility, `[-1, 1]`.
    pub norm: f64,
}

impl Appraisal {
    /// Evaluate a stimulus through an agent's personality.
    ///
    /// Neurotic agents weigh setbacks more heavily; open agents find
    /// the unfamiliar less jarring.
    pub fn evaluate(stimulus: &Stimulus, personality: &Personality) -> Self {
        let congruence = clamp_signed(stimulus.goal_congruence);
        let congruence = if congruence < 0.0 {
            clamp_signed(congruence * personality.neuroticism.mul_add(0.5, 1.0))
        } else {
            congruence
        };
        let novelty =
            clamp_unit(clamp_unit(stimulus.novelty) * personality.openness.mul_add(-0.3, 1.15));

        Self {
            novelty,
            relevance: clamp_unit(stimulus.goal_relevance),
            congruence,
            agency: stimulus.agency,
            norm: clamp_signed(stimulus.norm_compatibility),
        }
    }

    /// Map the appraisal through the rule table.
    ///
    /// Returns each triggered emotion with its initial intensity in
    /// `[0, 1]`. The table is evaluated top to bottom; several rules can
    /// fire for the same appraisal.
    pub fn emotions(&self, t: &AppraisalThresholds) -> Vec<(EmotionKind, f64)> {
        let mut out = Vec::new();
        let loss = -self.congruence;

        if loss >= t.high {
            let kind = match self.agency {
                Agency::Other => EmotionKind::Anger,
                Agency::SelfCaused => EmotionKind::Shame,
                Agency::Situation => EmotionKind::Sadness,
            };
            out.push((kind, loss));
        }
        if loss >= t.mid && self.novelty >= t.high {
            out.push((EmotionKind::Fear, (loss + self.novelty) / 2.0));
        }
        if self.congruence >= t.high && self.agency == Agency::SelfCaused {
            out.push((EmotionKind::Pride, self.congruence));
        }
        if self.congruence >= t.mid {
            out.push((EmotionKind::Joy, self.congruence));
        }
        if self.novelty <= t.low && self.congruence >= t.mid && self.agency == Agency::Other {
            out.push((EmotionKind::Trust, self.congruence * (1.0 - self.novelty)));
        }
        if self.novelty >= t.high {
            out.push((EmotionKind::Surprise, self.novelty));
        }
        if -self.norm >= t.high {
            out.push((EmotionKind::Disgust, -self.norm));
        }
        if self.relevance >= t.high && self.congruence.abs() < t.mid {
            out.push((EmotionKind::Anticipation, self.relevance));
        }
        if self.relevance >= t.high
            && self.congruence < 0.0
            && self.agency == Agency::Situation
            && self.novelty <= t.low
        {
            out.push((EmotionKind::Loneliness, self.relevance * loss));
        }

        out.into_iter()
            .map(|(kind, intensity)| (kind, clamp_unit(intensity)))
            .collect()
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn clamp_signed(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}
