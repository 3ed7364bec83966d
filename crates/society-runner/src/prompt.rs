//! Prompt template loading and rendering via `minijinja`.
//!
//! The default templates are compiled into the binary so the prompt for a
//! given personality, mood, and goal list is fully deterministic. Operators
//! can point [`PromptEngine::from_dir`] at a directory holding replacement
//! files to tune the wording without recompiling.
//!
//! Templates:
//!
//! - `system.j2` -- persona, traits, values, quirks, mood, strongest
//!   emotions, mood tendencies, goals, style
//! - `opening.j2` -- what the initiator sees when a conversation starts
//! - `injection.j2` -- how a human-injected message is framed
//! - `attribution.j2` -- how the partner's reply appears in a transcript

use minijinja::{Environment, context};
use society_types::{EmotionKind, Goal, MoodInfluence, MoodLabel, Personality};

use crate::error::GatewayError;

/// Trait value above which the "high" description is used.
pub const TRAIT_CUTOFF: f64 = 0.5;

/// Magnitude a mood tendency must exceed before the prompt mentions it.
pub const TENDENCY_CUTOFF: f64 = 0.3;

/// The affect state a cognitive cycle is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct Feeling {
    /// Mood label of the baseline.
    pub mood: MoodLabel,
    /// Tendencies derived from the current state.
    pub influence: MoodInfluence,
    /// Strongest active emotions, strongest first.
    pub emotions: Vec<EmotionKind>,
}

impl Feeling {
    /// A feeling with only a mood label.
    pub fn from_mood(mood: MoodLabel) -> Self {
        Self {
            mood,
            influence: MoodInfluence::default(),
            emotions: Vec::new(),
        }
    }
}

const TEMPLATES: [(&str, &str); 4] = [
    ("system", include_str!("../templates/system.j2")),
    ("opening", include_str!("../templates/opening.j2")),
    ("injection", include_str!("../templates/injection.j2")),
    ("attribution", include_str!("../templates/attribution.j2")),
];

/// Pick one of two canned descriptions for each Big Five trait.
///
/// A trait strictly above [`TRAIT_CUTOFF`] gets the high description; a
/// trait at or below it gets the low one.
pub fn describe_traits(p: &Personality) -> [&'static str; 5] {
    let pick = |value: f64, high: &'static str, low: &'static str| {
        if value > TRAIT_CUTOFF { high } else { low }
    };
    [
        pick(
            p.openness,
            "curious and open to new ideas",
            "practical and fond of the familiar",
        ),
        pick(
            p.conscientiousness,
            "organized and dependable",
            "spontaneous and easygoing",
        ),
        pick(p.extraversion, "outgoing and talkative", "reserved and quiet"),
        pick(p.agreeableness, "warm and cooperative", "blunt and competitive"),
        pick(
            p.neuroticism,
            "sensitive and quick to worry",
            "calm and emotionally steady",
        ),
    ]
}

/// Describe the mood tendencies strong enough to shape a reply.
///
/// A tendency is mentioned only when its magnitude strictly exceeds
/// [`TENDENCY_CUTOFF`].
pub fn describe_tendencies(influence: &MoodInfluence) -> Vec<&'static str> {
    let pick = |value: f64, high: &'static str, low: &'static str| {
        if value > TENDENCY_CUTOFF {
            Some(high)
        } else if value < -TENDENCY_CUTOFF {
            Some(low)
        } else {
            None
        }
    };
    [
        pick(
            influence.sociability,
            "you want company and are glad to keep talking",
            "you would rather keep to yourself",
        ),
        pick(
            influence.assertiveness,
            "you are inclined to speak your mind",
            "you are inclined to hold back and defer",
        ),
        pick(
            influence.impulsivity,
            "you tend to say the first thing that comes to mind",
            "you choose your words slowly",
        ),
        pick(
            influence.risk_aversion,
            "you steer clear of anything uncertain",
            "you are game for something new",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Unfinished goal descriptions, highest priority first.
pub fn open_goals(goals: &[Goal]) -> Vec<&str> {
    let mut open: Vec<&Goal> = goals.iter().filter(|g| !g.completed).collect();
    open.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    open.into_iter().map(|g| g.description.as_str()).collect()
}

/// Renders every prompt fragment an agent needs.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create an engine with the built-in templates.
    pub fn new() -> Result<Self, GatewayError> {
        let mut env = base_environment();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| GatewayError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Create an engine loading `<name>.j2` files from `dir`.
    ///
    /// Any template missing from the directory falls back to the built-in
    /// version.
    pub fn from_dir(dir: &str) -> Result<Self, GatewayError> {
        let mut env = base_environment();
        for (name, builtin) in TEMPLATES {
            let path = format!("{dir}/{name}.j2");
            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => builtin.to_owned(),
                Err(e) => {
                    return Err(GatewayError::Template(format!("failed to read {path}: {e}")));
                }
            };
            env.add_template_owned(name, source)
                .map_err(|e| GatewayError::Template(format!("failed to add {name} template: {e}")))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, GatewayError> {
        self.env
            .get_template(name)
            .map_err(|e| GatewayError::Template(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| GatewayError::Template(format!("{name} render failed: {e}")))
    }

    /// Render the system prompt for one cognitive cycle.
    pub fn system_prompt(
        &self,
        name: &str,
        personality: &Personality,
        feeling: &Feeling,
        goals: &[Goal],
    ) -> Result<String, GatewayError> {
        let emotions: Vec<&str> = feeling.emotions.iter().copied().map(EmotionKind::as_str).collect();
        self.render(
            "system",
            context! {
                name => name,
                traits => describe_traits(personality),
                core_values => &personality.core_values,
                quirks => &personality.quirks,
                mood => feeling.mood.as_str(),
                emotions => emotions,
                tendencies => describe_tendencies(&feeling.influence),
                goals => open_goals(goals),
            },
        )
    }

    /// Render the initiator's observational opening about its partner.
    pub fn opening(&self, partner: &str) -> Result<String, GatewayError> {
        self.render("opening", context! { partner => partner })
    }

    /// Render a human-injected message as transcript context.
    pub fn injection(&self, message: &str) -> Result<String, GatewayError> {
        self.render("injection", context! { message => message })
    }

    /// Render a partner's reply as it appears in the listener's transcript.
    pub fn attribution(&self, speaker: &str, content: &str) -> Result<String, GatewayError> {
        self.render(
            "attribution",
            context! { speaker => speaker, content => content },
        )
    }
}

fn base_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}
