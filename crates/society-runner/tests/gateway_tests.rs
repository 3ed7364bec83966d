//! Integration tests for the inference gateway against a scripted backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use common::Script;
use society_runner::{ChatMessage, CompletionRequest, GatewayConfig, GatewayError, InferenceGateway};
use tokio_util::sync::CancellationToken;

fn request(text: &str) -> CompletionRequest {
    CompletionRequest {
        system_prompt: "You are a test agent.".to_owned(),
        messages: vec![ChatMessage::user(text)],
        ..CompletionRequest::default()
    }
}

#[tokio::test]
async fn completes_against_ollama_wire_format() {
    let (mock, config) = common::spawn(Script::default()).await;
    let gateway = InferenceGateway::new(&config).unwrap();

    let response = gateway
        .complete(&CancellationToken::new(), request("hi"))
        .await
        .unwrap();

    assert_eq!(response.content, "Hello there.");
    assert_eq!(response.model, "mock-model");

    let body = &mock.bodies()[0];
    assert_eq!(body["stream"], false);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hi");
    assert_eq!(body["options"]["num_predict"], 512);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_semaphore() {
    let (mock, config) = common::spawn(Script {
        delay: Duration::from_millis(100),
        ..Script::default()
    })
    .await;
    let gateway = Arc::new(
        InferenceGateway::new(&GatewayConfig {
            max_concurrent_calls: 2,
            ..config
        })
        .unwrap(),
    );

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();
    for i in 0..6 {
        let gateway = Arc::clone(&gateway);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            gateway.complete(&cancel, request(&format!("call {i}"))).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(mock.calls(), 6);
    assert!(mock.peak() <= 2, "peak concurrency was {}", mock.peak());
    assert_eq!(gateway.in_flight(), 0);
    assert_eq!(gateway.available_permits(), 2);
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_call() {
    let (_mock, config) = common::spawn(Script {
        delay: Duration::from_secs(10),
        ..Script::default()
    })
    .await;
    let gateway = InferenceGateway::new(&config).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = gateway.complete(&cancel, request("hi")).await;

    assert!(matches!(result, Err(GatewayError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(gateway.in_flight(), 0);
}

#[tokio::test]
async fn cancelled_before_admission_never_calls_backend() {
    let (mock, config) = common::spawn(Script::default()).await;
    let gateway = InferenceGateway::new(&config).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = gateway.complete(&cancel, request("hi")).await;

    assert!(matches!(result, Err(GatewayError::Cancelled)));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let (_mock, config) = common::spawn(Script {
        delay: Duration::from_secs(10),
        ..Script::default()
    })
    .await;
    let gateway = InferenceGateway::new(&GatewayConfig {
        request_timeout_ms: 50,
        ..config
    })
    .unwrap();

    let result = gateway.complete(&CancellationToken::new(), request("hi")).await;
    assert!(matches!(result, Err(GatewayError::Timeout { after_ms: 50 })));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let (mock, config) = common::spawn(Script {
        failures: 1,
        ..Script::default()
    })
    .await;
    let gateway = InferenceGateway::new(&GatewayConfig {
        max_retries: 2,
        retry_backoff_ms: 10,
        ..config
    })
    .unwrap();

    let result = gateway.complete(&CancellationToken::new(), request("hi")).await;
    assert!(result.is_ok());
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (mock, config) = common::spawn(Script {
        failures: usize::MAX,
        fail_status: StatusCode::NOT_FOUND,
        ..Script::default()
    })
    .await;
    let gateway = InferenceGateway::new(&GatewayConfig {
        max_retries: 3,
        retry_backoff_ms: 10,
        ..config
    })
    .unwrap();

    let result = gateway.complete(&CancellationToken::new(), request("hi")).await;
    assert!(matches!(result, Err(GatewayError::Status { status: 404, .. })));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn retries_disabled_by_default() {
    let (mock, config) = common::spawn(Script {
        failures: 1,
        ..Script::default()
    })
    .await;
    let gateway = InferenceGateway::new(&config).unwrap();

    let result = gateway.complete(&CancellationToken::new(), request("hi")).await;
    assert!(matches!(result, Err(GatewayError::Status { status: 500, .. })));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn blank_reply_is_rejected() {
    let (_mock, config) = common::spawn(Script {
        reply: "   \n".to_owned(),
        ..Script::default()
    })
    .await;
    let gateway = InferenceGateway::new(&config).unwrap();

    let result = gateway.complete(&CancellationToken::new(), request("hi")).await;
    assert!(matches!(result, Err(GatewayError::EmptyResponse)));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let gateway = InferenceGateway::new(&GatewayConfig {
        api_url: "http://127.0.0.1:9".to_owned(),
        ..GatewayConfig::default()
    })
    .unwrap();

    let result = gateway.complete(&CancellationToken::new(), request("hi")).await;
    assert!(matches!(result, Err(GatewayError::Transport(_))));
}
