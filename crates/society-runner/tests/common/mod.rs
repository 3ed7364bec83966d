//! A scripted Ollama-compatible backend served by Axum on a loopback port.

#![allow(dead_code, clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use society_runner::GatewayConfig;

/// How the mock answers each `/api/chat` call.
#[derive(Clone)]
pub struct Script {
    /// Delay before answering.
    pub delay: Duration,
    /// Number of leading calls answered with `fail_status`.
    pub failures: usize,
    /// Status returned for failing calls.
    pub fail_status: StatusCode,
    /// Reply content for successful calls.
    pub reply: String,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            failures: 0,
            fail_status: StatusCode::INTERNAL_SERVER_ERROR,
            reply: "Hello there.".to_owned(),
        }
    }
}

/// Shared observation state of the mock.
pub struct Mock {
    script: Script,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
}

impl Mock {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn chat(State(mock): State<Arc<Mock>>, Json(body): Json<Value>) -> Response {
    let call = mock.calls.fetch_add(1, Ordering::SeqCst);
    let now = mock.active.fetch_add(1, Ordering::SeqCst) + 1;
    let _guard = ActiveGuard(&mock.active);
    mock.peak.fetch_max(now, Ordering::SeqCst);
    mock.bodies.lock().unwrap().push(body.clone());

    tokio::time::sleep(mock.script.delay).await;

    if call < mock.script.failures {
        return (mock.script.fail_status, "scripted failure").into_response();
    }
    Json(json!({
        "model": body["model"],
        "message": {"role": "assistant", "content": mock.script.reply},
        "done": true
    }))
    .into_response()
}

/// Start the mock and return a config pointing at it.
pub async fn spawn(script: Script) -> (Arc<Mock>, GatewayConfig) {
    let mock = Arc::new(Mock {
        script,
        calls: AtomicUsize::new(0),
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
        bodies: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/api/chat", post(chat))
        .with_state(Arc::clone(&mock));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = GatewayConfig {
        api_url: format!("http://{addr}"),
        model: "mock-model".to_owned(),
        ..GatewayConfig::default()
    };
    (mock, config)
}
