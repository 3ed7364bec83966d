//! Operator REST API handlers for runtime scheduler control.
//!
//! These endpoints give one-way command authority over tick issuance.
//! They never touch a conversation already in progress.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/pause` | Stop issuing ticks |
//! | `POST` | `/api/operator/resume` | Resume issuing ticks |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `GET` | `/api/operator/status` | Scheduler status and society counters |
//! | `POST` | `/api/operator/stop` | Drain and shut down the scheduler |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use society_core::{MIN_TICK_INTERVAL_MS, OperatorState, SchedulerStatus};

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds.
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

/// Response for `GET /api/operator/status`.
#[derive(Debug, serde::Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    scheduler: SchedulerStatus,
    active_agents: u64,
    total_turns: u64,
    uptime: String,
}

/// Render whole seconds as `2h15m30s`, dropping leading zero units.
fn format_uptime(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ObserverError> {
    state
        .operator
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable("operator state not available".to_owned()))
}

/// Pause tick issuance. Running conversations finish normally.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.pause();
    Ok(Json(OperatorResponse {
        ok: true,
        message: "Scheduler paused".to_owned(),
    }))
}

/// Resume tick issuance after a pause.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.resume();
    Ok(Json(OperatorResponse {
        ok: true,
        message: "Scheduler resumed".to_owned(),
    }))
}

/// Change the tick interval at runtime.
///
/// The scheduler picks up the new interval before its next tick.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let prev = operator(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .ok_or_else(|| {
            ObserverError::BadRequest(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            ))
        })?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Tick interval changed from {prev}ms to {}ms", body.tick_interval_ms),
        "previous_interval_ms": prev,
        "new_interval_ms": body.tick_interval_ms,
    })))
}

/// Scheduler status plus active-agent and persisted-turn counts.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let scheduler = operator(&state)?.status(state.clock.current());
    let active_agents = state.repository.count_active_agents().await?;
    let total_turns = state.repository.count_turns().await?;
    Ok(Json(StatusResponse {
        uptime: format_uptime(scheduler.elapsed_seconds),
        scheduler,
        active_agents,
        total_turns,
    }))
}

/// Request a graceful stop.
///
/// No new ticks are issued; conversations already running are allowed to
/// finish. The HTTP server keeps serving until the process exits.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_stop();
    Ok(Json(OperatorResponse {
        ok: true,
        message: "Stop requested -- running conversations will finish first".to_owned(),
    }))
}
