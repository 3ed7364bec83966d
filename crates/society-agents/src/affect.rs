//! The per-agent affect engine.
//!
//! Holds three PAD points:
//!
//! - **current** -- reacts immediately to appraised stimuli
//! - **baseline** -- the mood, a slow average of the current state
//! - **bias** -- the resting point derived once from personality
//!
//! plus a bounded set of active [`DiscreteEmotion`]s. All PAD values are
//! clamped to `[-1, 1]` after every mutation.
//!
//! The engine does no I/O and holds no locks; the owning mind serializes
//! access to it.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use society_types::{
    EmotionKind, MOOD_SNAPSHOT_VERSION, MoodInfluence, MoodLabel, MoodSnapshot, Pad, Personality,
};

use crate::appraisal::{Appraisal, Stimulus};
use crate::config::AffectConfig;
use crate::emotion::{DiscreteEmotion, pad_direction};
use crate::mood::{mood_influence, mood_label};

/// Compute the personality's resting PAD point.
///
/// - pleasure rises with extraversion and agreeableness, falls with
///   neuroticism
/// - arousal rises with openness, extraversion, and neuroticism
/// - dominance rises with conscientiousness and extraversion, falls with
///   neuroticism and agreeableness
///
/// A personality with every trait at 0.5 rests at the origin.
pub fn personality_bias(p: &Personality) -> Pad {
    let pleasure = (p.extraversion + p.agreeableness) / 2.0 - p.neuroticism;
    let arousal = ((p.openness + p.extraversion + p.neuroticism) / 3.0).mul_add(2.0, -1.0);
    let dominance =
        (p.conscientiousness + p.extraversion) / 2.0 - (p.neuroticism + p.agreeableness) / 2.0;
    Pad::new(pleasure, arousal, dominance)
}

/// Continuous PAD state plus discrete emotions for one agent.
#[derive(Debug, Clone)]
pub struct AffectEngine {
    config: AffectConfig,
    personality: Personality,
    bias: Pad,
    current: Pad,
    baseline: Pad,
    emotions: Vec<DiscreteEmotion>,
}

impl AffectEngine {
    /// Create an engine resting at the personality's bias point.
    pub fn new(personality: Personality, config: AffectConfig) -> Self {
        let bias = personality_bias(&personality);
        Self {
            config,
            personality,
            bias,
            current: bias,
            baseline: bias,
            emotions: Vec::new(),
        }
    }

    /// Restore an engine from a stored mood snapshot.
    ///
    /// Discrete emotions are transient and are not restored.
    pub fn from_snapshot(
        personality: Personality,
        config: AffectConfig,
        snapshot: &MoodSnapshot,
    ) -> Self {
        let mut engine = Self::new(personality, config);
        engine.current = Pad::new(
            snapshot.current.pleasure,
            snapshot.current.arousal,
            snapshot.current.dominance,
        );
        engine.baseline = Pad::new(
            snapshot.baseline.pleasure,
            snapshot.baseline.arousal,
            snapshot.baseline.dominance,
        );
        engine
    }

    /// Advance the engine by `elapsed` wall time.
    pub fn update(&mut self, elapsed: Duration) {
        self.update_at(elapsed, Utc::now());
    }

    /// Advance the engine by `elapsed`, pruning emotions as of `now`.
    ///
    /// 1. The current state decays toward the baseline.
    /// 2. The baseline drifts toward the pre-decay current state, slowed by
    ///    `mood_inertia`, and is pulled slightly toward the bias.
    /// 3. Emotion intensities fade by the same step; expired or weak ones
    ///    are removed.
    pub fn update_at(&mut self, elapsed: Duration, now: DateTime<Utc>) {
        let step = (self.config.decay_rate * elapsed.as_secs_f64()).clamp(0.0, 1.0);
        let sample = self.current;

        self.current = self.current.lerp(self.baseline, step);

        let inertia = self.config.mood_inertia.clamp(0.0, 1.0);
        self.baseline = self.baseline.lerp(sample, (1.0 - inertia) * step);
        self.baseline = self.baseline.lerp(self.bias, self.config.bias_pull * step);

        for emotion in &mut self.emotions {
            emotion.intensity = (emotion.intensity * (1.0 - step)).clamp(0.0, 1.0);
        }
        let min = self.config.min_intensity;
        self.emotions
            .retain(|e| e.intensity >= min && !e.is_expired(now));
    }

    /// Appraise a stimulus, adding emotions and shifting the current state.
    ///
    /// Returns the emotions the stimulus triggered.
    pub fn appraise(&mut self, stimulus: &Stimulus) -> Vec<EmotionKind> {
        self.appraise_at(stimulus, Utc::now())
    }

    /// Appraise a stimulus as of `now`.
    pub fn appraise_at(&mut self, stimulus: &Stimulus, now: DateTime<Utc>) -> Vec<EmotionKind> {
        let appraisal = Appraisal::evaluate(stimulus, &self.personality);
        let triggered = appraisal.emotions(&self.config.appraisal_thresholds);

        let duration = i64::try_from(self.config.emotion_duration_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);

        let mut kinds = Vec::with_capacity(triggered.len());
        for (kind, intensity) in triggered {
            self.current = self
                .current
                .shifted(pad_direction(kind), intensity * self.config.reactivity);
            self.add_emotion(DiscreteEmotion::new(
                kind,
                intensity,
                stimulus.description.clone(),
                now,
                duration,
            ));
            kinds.push(kind);
        }

        tracing::trace!(
            triggered = kinds.len(),
            pleasure = self.current.pleasure,
            arousal = self.current.arousal,
            "stimulus appraised"
        );
        kinds
    }

    /// Add an emotion, merging with an existing one of the same kind and
    /// evicting the weakest when over capacity.
    fn add_emotion(&mut self, emotion: DiscreteEmotion) {
        if emotion.intensity < self.config.min_intensity {
            return;
        }
        if let Some(existing) = self.emotions.iter_mut().find(|e| e.kind == emotion.kind) {
            existing.intensity = existing.intensity.max(emotion.intensity);
            existing.trigger = emotion.trigger;
            existing.started_at = emotion.started_at;
            existing.duration = emotion.duration;
            return;
        }
        self.emotions.push(emotion);
        let cap = self.config.max_emotions.max(1);
        while self.emotions.len() > cap {
            let weakest = self
                .emotions
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.intensity.total_cmp(&b.intensity))
                .map(|(i, _)| i);
            match weakest {
                Some(i) => {
                    self.emotions.swap_remove(i);
                }
                None => break,
            }
        }
    }

    /// The fast-reacting state.
    pub const fn current(&self) -> Pad {
        self.current
    }

    /// The mood baseline.
    pub const fn baseline(&self) -> Pad {
        self.baseline
    }

    /// The personality resting point.
    pub const fn bias(&self) -> Pad {
        self.bias
    }

    /// Active discrete emotions, in no particular order.
    pub fn emotions(&self) -> &[DiscreteEmotion] {
        &self.emotions
    }

    /// The `n` strongest active emotions, strongest first.
    pub fn dominant_emotions(&self, n: usize) -> Vec<&DiscreteEmotion> {
        let mut sorted: Vec<&DiscreteEmotion> = self.emotions.iter().collect();
        sorted.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
        sorted.truncate(n);
        sorted
    }

    /// Mood label of the current baseline.
    pub fn mood_label(&self) -> MoodLabel {
        mood_label(self.baseline, &self.config.mood_thresholds)
    }

    /// Behavioral influence of the current state.
    pub fn mood_influence(&self) -> MoodInfluence {
        mood_influence(self.current)
    }

    /// Serializable snapshot for persistence.
    pub fn snapshot(&self) -> MoodSnapshot {
        MoodSnapshot {
            version: MOOD_SNAPSHOT_VERSION,
            current: self.current,
            baseline: self.baseline,
            label: self.mood_label(),
            influence: self.mood_influence(),
        }
    }
}
