//! Observer API server for the agent society.
//!
//! Serves the live event stream over `WebSocket`, accepts human-injected
//! messages, and exposes operator and agent-control endpoints. Runs
//! alongside the scheduler and shares its [`Hub`](society_core::Hub),
//! [`OperatorState`](society_core::OperatorState), and repository.
//!
//! # Modules
//!
//! - [`error`] -- [`ObserverError`] and its HTTP mapping
//! - [`handlers`] -- Status page, health, injection, and agent endpoints
//! - [`operator`] -- Pause, resume, speed, stop, and status endpoints
//! - [`router`] -- Route table and middleware
//! - [`server`] -- TCP bind and serve
//! - [`startup`] -- Background spawn helper for the engine
//! - [`state`] -- [`AppState`]
//! - [`ws`] -- `GET /ws/events`

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
