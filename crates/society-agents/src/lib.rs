//! Affect model and working memory for agents in the agent society.
//!
//! This crate is pure computation: nothing here performs I/O or awaits.
//! It sits between `society-types` (the data model) and the runner and
//! core crates (inference and orchestration).
//!
//! # Modules
//!
//! - [`affect`] -- [`AffectEngine`]: PAD state, decay, mood drift
//! - [`appraisal`] -- Stimulus evaluation and the emotion rule table
//! - [`config`] -- Tunables ([`AffectConfig`], thresholds)
//! - [`emotion`] -- Discrete emotions and their PAD directions
//! - [`mood`] -- Mood label and mood influence mappings
//! - [`thoughts`] -- Fixed-capacity working-thought buffer

pub mod affect;
pub mod appraisal;
pub mod config;
pub mod emotion;
pub mod mood;
pub mod thoughts;

// Re-export primary types at crate root for convenience.
pub use affect::{AffectEngine, personality_bias};
pub use appraisal::{Agency, Appraisal, Stimulus};
pub use config::{AffectConfig, AppraisalThresholds, MoodThresholds};
pub use emotion::{DiscreteEmotion, pad_direction};
pub use mood::{mood_influence, mood_label};
pub use thoughts::ThoughtBuffer;
