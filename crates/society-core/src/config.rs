//! Configuration loading and typed config structures for the agent society.
//!
//! The canonical configuration lives in `society-config.yaml` at the project
//! root. Every section is optional; a missing section or field takes the
//! default documented on the struct.

use std::path::Path;

use serde::Deserialize;
use society_agents::AffectConfig;
use society_runner::{BrainConfig, GatewayConfig};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override or field value is invalid.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `society-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SocietyConfig {
    /// Scheduling settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Inference backend and gateway settings.
    #[serde(default)]
    pub llm: GatewayConfig,

    /// Per-agent working memory.
    #[serde(default)]
    pub brain: BrainConfig,

    /// Prompt template overrides.
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Affect model tunables.
    #[serde(default)]
    pub affect: AffectConfig,

    /// Event hub settings.
    #[serde(default)]
    pub hub: HubConfig,

    /// Infrastructure connection settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SocietyConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// Recognized variables: `DATABASE_URL`, `OBSERVER_PORT`, and the
    /// gateway variables listed in [`society_runner::config`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides_from(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.llm
            .apply_overrides_from(&lookup)
            .map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })?;
        self.infrastructure.apply_overrides_from(&lookup)
    }
}

/// How the scheduler treats agents already in a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationPolicy {
    /// An agent may take part in several overlapping conversations.
    #[default]
    AllowOverlap,
    /// A tick whose pair includes a busy agent is skipped.
    ExclusivePerAgent,
}

/// Scheduling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Interval between ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Turns exchanged per conversation.
    pub turns_per_conversation: u32,
    /// Overlap policy for busy agents.
    pub participation: ParticipationPolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10_000,
            turns_per_conversation: 4,
            participation: ParticipationPolicy::AllowOverlap,
        }
    }
}

/// Prompt template overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Directory of `<name>.j2` files replacing the built-in templates.
    pub template_dir: Option<String>,
}

/// Event hub settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Bounded queue size per observer.
    pub subscriber_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 32,
        }
    }
}

/// Infrastructure connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InfrastructureConfig {
    /// `PostgreSQL` connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Observer HTTP port.
    pub observer_port: u16,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            observer_port: 8080,
        }
    }
}

impl InfrastructureConfig {
    fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(raw) = lookup("OBSERVER_PORT") {
            self.observer_port = raw.parse().map_err(|e| ConfigError::Invalid {
                message: format!("invalid OBSERVER_PORT: {e}"),
            })?;
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Plain,
        }
    }
}
