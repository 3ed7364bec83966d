//! `PostgreSQL` persistence for the agent society.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and migrations
//! - [`agent_store`] -- Agent and conversation-turn queries, and the
//!   [`PgRepository`] implementation of the scheduler's repository trait
//! - [`error`] -- Shared error types

pub mod agent_store;
pub mod error;
pub mod postgres;

pub use agent_store::{AgentRow, AgentStore, PgRepository, TurnRow};
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
