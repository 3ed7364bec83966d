//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness probe
/// - `GET /ws/events` -- `WebSocket` event stream
/// - `GET|POST /api/agents` -- list or spawn agents
/// - `GET|DELETE /api/agents/{id}` -- read or deactivate one agent
/// - `POST /api/agents/{id}/inject` -- queue a human message
/// - `/api/operator/*` -- pause, resume, speed, stop, status
///
/// CORS allows any origin so a dashboard can be served from elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws/events", get(ws::ws_events))
        // Agents
        .route(
            "/api/agents",
            get(handlers::list_agents).post(handlers::spawn_agent),
        )
        .route(
            "/api/agents/{id}",
            get(handlers::get_agent).delete(handlers::deactivate_agent),
        )
        .route("/api/agents/{id}/inject", post(handlers::inject))
        // Operator
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
