//! Scheduling and orchestration for the agent society.
//!
//! The scheduler pulls two agents per tick, lets them converse through
//! their minds, persists and broadcasts every turn, and forwards live
//! thoughts to observers. All shared state lives in explicit components
//! ([`Hub`], [`OperatorState`], [`TickClock`]) handed out as `Arc`s.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick counter
//! - [`config`] -- `society-config.yaml` loading and typed sections
//! - [`conversation`] -- One two-agent conversation
//! - [`hub`] -- Observer fan-out and the injection queue
//! - [`mind`] -- Per-agent brain and affect pairing
//! - [`operator`] -- Pause, resume, speed, and stop controls
//! - [`repository`] -- Storage boundary and the in-memory store
//! - [`scheduler`] -- Tick issuance

pub mod clock;
pub mod config;
pub mod conversation;
pub mod hub;
pub mod mind;
pub mod operator;
pub mod repository;
pub mod scheduler;

pub use clock::{ClockError, TickClock};
pub use config::{
    ConfigError, HubConfig, InfrastructureConfig, LogFormat, LoggingConfig, ParticipationPolicy,
    PromptConfig, SocietyConfig, WorldConfig,
};
pub use conversation::{
    ConversationContext, ConversationOutcome, ConversationPlan, SkipReason, run_conversation,
};
pub use hub::{Hub, HubError, Subscription};
pub use mind::{AgentMind, MindRegistry};
pub use operator::{ConversationGuard, MIN_TICK_INTERVAL_MS, OperatorState, SchedulerStatus};
pub use repository::{
    AgentFilter, AgentPage, DEFAULT_PAGE_LIMIT, InMemoryRepository, MAX_PAGE_LIMIT, Repository,
    RepositoryError,
};
pub use scheduler::Scheduler;
