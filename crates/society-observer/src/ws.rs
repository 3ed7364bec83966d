//! `WebSocket` handler for the live event stream.
//!
//! Clients connect to `GET /ws/events`, receive a
//! `{"type":"connected"}` greeting, then every conversation turn and
//! thought the hub broadcasts, one JSON text frame each. Each client owns
//! a bounded hub subscription; a client too slow to keep up loses events
//! rather than stalling the scheduler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use society_types::ObserverEvent;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming hub events.
///
/// # Route
///
/// `GET /ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: subscribe, greet, forward events, and
/// unsubscribe on the way out.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut subscription = state.hub.subscribe();
    debug!(subscriber = subscription.id(), "WebSocket client connected");

    match serde_json::to_string(&ObserverEvent::Connected) {
        Ok(greeting) => {
            if socket.send(Message::Text(greeting.into())).await.is_err() {
                state.hub.unsubscribe(subscription);
                return;
            }
        }
        Err(e) => warn!("Failed to serialize greeting: {e}"),
    }

    loop {
        tokio::select! {
            payload = subscription.recv() => {
                let Some(payload) = payload else {
                    debug!("Hub dropped subscription, closing WebSocket");
                    break;
                };
                if socket.send(Message::Text(payload.as_ref().into())).await.is_err() {
                    debug!("WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.hub.unsubscribe(subscription);
}
