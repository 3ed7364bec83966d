//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds handles to the same components the scheduler uses.
//! Nothing here is copied or snapshotted: a handler reads the live hub,
//! clock, and repository, so the observer never blocks tick issuance.

use std::sync::Arc;

use society_core::{Hub, MindRegistry, OperatorState, Repository, TickClock};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Observer fan-out and injection queue.
    pub hub: Arc<Hub>,
    /// Agent storage.
    pub repository: Arc<dyn Repository>,
    /// Tick counter, read for status reporting.
    pub clock: Arc<TickClock>,
    /// Operator controls. `None` when the server runs without a scheduler.
    pub operator: Option<Arc<OperatorState>>,
    /// Cached minds, dropped when an agent is deactivated.
    pub minds: Option<Arc<MindRegistry>>,
}

impl AppState {
    /// Create state with no operator controls attached.
    pub fn new(hub: Arc<Hub>, repository: Arc<dyn Repository>, clock: Arc<TickClock>) -> Self {
        Self {
            hub,
            repository,
            clock,
            operator: None,
            minds: None,
        }
    }

    /// Attach the scheduler's operator controls.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Attach the scheduler's mind registry.
    #[must_use]
    pub fn with_minds(mut self, minds: Arc<MindRegistry>) -> Self {
        self.minds = Some(minds);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("subscribers", &self.hub.subscriber_count())
            .field("tick", &self.clock.current())
            .field("operator", &self.operator.is_some())
            .finish_non_exhaustive()
    }
}
