//! Integration tests for the Observer API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, except for the `WebSocket` test which needs a
//! real upgrade and binds to an ephemeral port.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use society_core::{Hub, InMemoryRepository, OperatorState, Repository, TickClock};
use society_observer::router::build_router;
use society_observer::state::AppState;
use society_types::{
    AgentId, AgentRecord, ConversationEvent, ConversationTurn, ObserverEvent, Personality,
};
use tower::ServiceExt;

struct Fixture {
    state: Arc<AppState>,
    hub: Arc<Hub>,
    repository: Arc<InMemoryRepository>,
    operator: Arc<OperatorState>,
    agent_id: AgentId,
}

fn fixture() -> Fixture {
    let record = AgentRecord::new("Ada", &Personality::new(0.8, 0.5, 0.7, 0.6, 0.3)).unwrap();
    let agent_id = record.id;
    let repository = Arc::new(InMemoryRepository::with_agents([record]));
    let hub = Arc::new(Hub::new(8));
    let operator = Arc::new(OperatorState::new(1_000));
    let state = AppState::new(
        Arc::clone(&hub),
        Arc::clone(&repository) as Arc<dyn Repository>,
        Arc::new(TickClock::new()),
    )
    .with_operator(Arc::clone(&operator));

    Fixture {
        state: Arc::new(state),
        hub,
        repository,
        operator,
        agent_id,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, json: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Status and health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_returns_html() {
    let f = fixture();
    let response = build_router(f.state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Agent Society"));
    assert!(html.contains("/ws/events"));
}

#[tokio::test]
async fn health_is_ok() {
    let f = fixture();
    let response = build_router(f.state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["status"], "ok");
}

// ---------------------------------------------------------------------------
// Injection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inject_accepts_and_queues() {
    let f = fixture();
    let uri = format!("/api/agents/{}/inject", f.agent_id);
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(&uri, &serde_json::json!({"content": "ask about their day"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["pending"], 1);
    assert_eq!(f.hub.drain_injections(f.agent_id), ["ask about their day"]);
}

#[tokio::test]
async fn inject_empty_content_is_400() {
    let f = fixture();
    let uri = format!("/api/agents/{}/inject", f.agent_id);
    for body in [
        serde_json::json!({"content": ""}),
        serde_json::json!({"content": "   "}),
        serde_json::json!({}),
    ] {
        let response = build_router(Arc::clone(&f.state))
            .oneshot(post_json(&uri, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(f.hub.pending_injections(f.agent_id), 0);
}

#[tokio::test]
async fn inject_unknown_agent_is_404() {
    let f = fixture();
    let unknown = AgentId::new();
    let uri = format!("/api/agents/{unknown}/inject");
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(&uri, &serde_json::json!({"content": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(f.hub.pending_injections(unknown), 0);
}

#[tokio::test]
async fn inject_inactive_agent_is_404() {
    let f = fixture();
    f.repository.deactivate_agent(f.agent_id).await.unwrap();
    let uri = format!("/api/agents/{}/inject", f.agent_id);
    let response = build_router(f.state)
        .oneshot(post_json(&uri, &serde_json::json!({"content": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inject_invalid_uuid_is_400() {
    let f = fixture();
    let response = build_router(f.state)
        .oneshot(post_json(
            "/api/agents/not-a-uuid/inject",
            &serde_json::json!({"content": "hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_and_get_agents() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(Request::get("/api/agents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["agents"][0]["name"], "Ada");
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["limit"], 20);
    assert_eq!(json["pagination"]["total"], 1);
    assert!(json["agents"][0].get("stats").is_none());

    let response = build_router(f.state)
        .oneshot(
            Request::get(format!("/api/agents/{}", f.agent_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["personality"]["openness"], 0.8);
    assert_eq!(json["mood"]["label"], "neutral");
    assert_eq!(json["active"], true);
    assert_eq!(json["stats"]["total_interactions"], 0);
    assert_eq!(json["stats"]["days_since_creation"], 0);
}

#[tokio::test]
async fn list_agents_pages_and_filters() {
    let f = fixture();
    for name in ["Bo", "Cy", "Di"] {
        let record = AgentRecord::new(name, &Personality::default()).unwrap();
        f.repository.create_agent(&record).await.unwrap();
    }
    let retired = AgentRecord::new("Ed", &Personality::default()).unwrap();
    f.repository.create_agent(&retired).await.unwrap();
    f.repository.deactivate_agent(retired.id).await.unwrap();

    let get = |uri: &'static str| {
        let state = Arc::clone(&f.state);
        async move {
            let response = build_router(state)
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            body_to_json(response.into_body()).await
        }
    };

    let json = get("/api/agents?page=2&limit=2").await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["agents"][0]["name"], "Cy");
    assert_eq!(json["agents"][1]["name"], "Di");
    assert_eq!(json["pagination"]["page"], 2);
    assert_eq!(json["pagination"]["limit"], 2);
    assert_eq!(json["pagination"]["total"], 5);

    let json = get("/api/agents?active=false").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["agents"][0]["name"], "Ed");
    assert_eq!(json["pagination"]["total"], 1);

    let json = get("/api/agents?active=true&limit=1000").await;
    assert_eq!(json["count"], 4);
    assert_eq!(json["pagination"]["limit"], 100);
}

#[tokio::test]
async fn get_agent_counts_interactions() {
    let f = fixture();
    let bo = AgentRecord::new("Bo", &Personality::default()).unwrap();
    f.repository.create_agent(&bo).await.unwrap();
    for turn in [
        ConversationTurn::new(f.agent_id, bo.id, "Morning!", 1),
        ConversationTurn::new(bo.id, f.agent_id, "Morning to you.", 1),
        ConversationTurn::new(f.agent_id, bo.id, "Lovely day.", 2),
    ] {
        f.repository.save_conversation_turn(&turn).await.unwrap();
    }

    let response = build_router(f.state)
        .oneshot(
            Request::get(format!("/api/agents/{}", bo.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["stats"]["total_interactions"], 3);
}

#[tokio::test]
async fn get_unknown_agent_is_404() {
    let f = fixture();
    let response = build_router(f.state)
        .oneshot(
            Request::get(format!("/api/agents/{}", AgentId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn spawn_agent_creates_active_record() {
    let f = fixture();
    let body = serde_json::json!({
        "name": "Bo",
        "personality": {
            "openness": 0.2,
            "conscientiousness": 0.7,
            "extraversion": 0.3,
            "agreeableness": 0.6,
            "neuroticism": 0.8,
            "core_values": ["patience"]
        },
        "goals": ["learn the neighbours' names"]
    });
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json("/api/agents", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "Bo");
    assert_eq!(json["goals"][0]["description"], "learn the neighbours' names");

    let agents = f.repository.list_agents().await.unwrap();
    assert_eq!(agents.len(), 2);
    let bo = agents.iter().find(|a| a.name == "Bo").unwrap();
    assert!(bo.active);
    assert_eq!(bo.personality().unwrap().core_values, ["patience"]);
}

#[tokio::test]
async fn spawn_agent_without_personality_draws_one() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json("/api/agents", &serde_json::json!({"name": "Cy"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_to_json(response.into_body()).await;
    let openness = json["personality"]["openness"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&openness));
}

#[tokio::test]
async fn spawn_agent_blank_name_is_400() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json("/api/agents", &serde_json::json!({"name": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(f.repository.list_agents().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deactivate_agent() {
    let f = fixture();
    f.hub.inject(f.agent_id, "are you still there?").unwrap();
    assert_eq!(f.hub.pending_injections(f.agent_id), 1);

    let uri = format!("/api/agents/{}", f.agent_id);
    let response = build_router(Arc::clone(&f.state))
        .oneshot(Request::delete(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = f.repository.get_agent(f.agent_id).await.unwrap().unwrap();
    assert!(!record.active);
    assert!(f.repository.random_active_agents(2).await.unwrap().is_empty());
    assert_eq!(f.hub.pending_injections(f.agent_id), 0);

    let response = build_router(f.state)
        .oneshot(
            Request::delete(format!("/api/agents/{}", AgentId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pause_resume_and_status() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(Request::post("/api/operator/pause").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(f.operator.is_paused());

    let response = build_router(Arc::clone(&f.state))
        .oneshot(Request::get("/api/operator/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["paused"], true);
    assert_eq!(json["tick"], 0);
    assert_eq!(json["tick_interval_ms"], 1_000);
    assert_eq!(json["active_agents"], 1);
    assert_eq!(json["total_turns"], 0);
    assert!(json["uptime"].as_str().unwrap().ends_with('s'));

    let response = build_router(f.state)
        .oneshot(Request::post("/api/operator/resume").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!f.operator.is_paused());
}

#[tokio::test]
async fn status_counts_active_agents_and_turns() {
    let f = fixture();
    let bo = AgentRecord::new("Bo", &Personality::default()).unwrap();
    f.repository.create_agent(&bo).await.unwrap();
    f.repository
        .save_conversation_turn(&ConversationTurn::new(f.agent_id, bo.id, "Hi.", 1))
        .await
        .unwrap();
    f.repository
        .save_conversation_turn(&ConversationTurn::new(bo.id, f.agent_id, "Hello.", 1))
        .await
        .unwrap();
    f.repository.deactivate_agent(bo.id).await.unwrap();

    let response = build_router(f.state)
        .oneshot(Request::get("/api/operator/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["active_agents"], 1);
    assert_eq!(json["total_turns"], 2);
}

#[tokio::test]
async fn speed_rejects_too_fast() {
    let f = fixture();
    let response = build_router(Arc::clone(&f.state))
        .oneshot(post_json(
            "/api/operator/speed",
            &serde_json::json!({"tick_interval_ms": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(f.operator.tick_interval_ms(), 1_000);

    let response = build_router(f.state)
        .oneshot(post_json(
            "/api/operator/speed",
            &serde_json::json!({"tick_interval_ms": 250}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["previous_interval_ms"], 1_000);
    assert_eq!(f.operator.tick_interval_ms(), 250);
}

#[tokio::test]
async fn stop_sets_flag() {
    let f = fixture();
    let response = build_router(f.state)
        .oneshot(Request::post("/api/operator/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(f.operator.is_stop_requested());
}

#[tokio::test]
async fn operator_routes_without_operator_are_503() {
    let f = fixture();
    let bare = AppState::new(
        Arc::clone(&f.hub),
        Arc::clone(&f.repository) as Arc<dyn Repository>,
        Arc::new(TickClock::new()),
    );
    let response = build_router(Arc::new(bare))
        .oneshot(Request::post("/api/operator/pause").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn nonexistent_route_returns_404() {
    let f = fixture();
    let response = build_router(f.state)
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Hub fan-out as seen by the observer state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hub_events_reach_subscribers_and_unsubscribe_releases() {
    let f = fixture();
    let mut subscription = f.state.hub.subscribe();
    assert_eq!(f.hub.subscriber_count(), 1);

    let event = ObserverEvent::Conversation(ConversationEvent {
        speaker_name: "Ada".to_owned(),
        target_name: "Bo".to_owned(),
        content: "Lovely morning.".to_owned(),
        agent_id: f.agent_id,
        tick: 1,
    });
    assert_eq!(f.hub.broadcast(&event), 1);

    let payload = subscription.recv().await.unwrap();
    let json: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(json["type"], "conversation");
    assert_eq!(json["tick"], 1);

    f.hub.unsubscribe(subscription);
    assert_eq!(f.hub.subscriber_count(), 0);
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn websocket_greets_forwards_and_unsubscribes() {
    use futures::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let f = fixture();
    let shutdown = tokio_util::sync::CancellationToken::new();
    let (addr, server) =
        society_observer::spawn_observer(0, Arc::clone(&f.state), shutdown.clone())
            .await
            .unwrap();

    let url = format!("ws://127.0.0.1:{}/ws/events", addr.port());
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let greeting = socket.next().await.unwrap().unwrap();
    let json: Value = serde_json::from_str(greeting.to_text().unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"type": "connected"}));
    assert_eq!(f.hub.subscriber_count(), 1);

    let event = ObserverEvent::Conversation(ConversationEvent {
        speaker_name: "Ada".to_owned(),
        target_name: "Bo".to_owned(),
        content: "Have you seen the river today?".to_owned(),
        agent_id: f.agent_id,
        tick: 3,
    });
    assert_eq!(f.hub.broadcast(&event), 1);

    let frame = socket.next().await.unwrap().unwrap();
    let json: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(json["type"], "conversation");
    assert_eq!(json["speakerName"], "Ada");
    assert_eq!(json["tick"], 3);

    socket.send(Message::Close(None)).await.unwrap();
    for _ in 0..100 {
        if f.hub.subscriber_count() == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(f.hub.subscriber_count(), 0);

    shutdown.cancel();
    server.await.unwrap();
}
