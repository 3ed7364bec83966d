//! Integration tests for the cognitive cycle against a scripted backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::Script;
use society_runner::{
    Brain, BrainConfig, ChatMessage, Feeling, GatewayError, InferenceGateway, PromptEngine,
};
use society_types::{AgentId, EmotionKind, Goal, MoodInfluence, MoodLabel, Personality, ThoughtType};
use tokio_util::sync::CancellationToken;

fn brain_for(
    config: &society_runner::GatewayConfig,
    personality: Personality,
    brain_config: &BrainConfig,
) -> (Brain, tokio::sync::mpsc::Receiver<society_types::Thought>) {
    let gateway = Arc::new(InferenceGateway::new(config).unwrap());
    let prompts = Arc::new(PromptEngine::new().unwrap());
    Brain::new(AgentId::new(), personality, gateway, prompts, brain_config)
}

fn neutral() -> Feeling {
    Feeling::from_mood(MoodLabel::Neutral)
}

#[tokio::test]
async fn think_sends_persona_and_temperature() {
    let (mock, config) = common::spawn(Script {
        reply: "  Lovely morning, isn't it?  ".to_owned(),
        ..Script::default()
    })
    .await;
    let personality = Personality::new(0.6, 0.5, 0.9, 0.5, 0.2).with_core_values(["curiosity"]);
    let (brain, mut stream) = brain_for(&config, personality, &BrainConfig::default());

    let goals = [Goal::new("learn the neighbours' names", 0.7)];
    let history = [ChatMessage::user("You notice Bo nearby.")];
    let reply = brain
        .think(
            &CancellationToken::new(),
            "Ada",
            &Feeling::from_mood(MoodLabel::Content),
            &goals,
            &history,
        )
        .await
        .unwrap();

    assert_eq!(reply, "Lovely morning, isn't it?");

    let body = &mock.bodies()[0];
    let temperature = body["options"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.8).abs() < 1e-9);

    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("You are Ada"));
    assert!(system.contains("you feel content"));
    assert!(system.contains("learn the neighbours' names"));
    assert!(system.contains("curiosity"));

    let thoughts = brain.recent_thoughts();
    assert_eq!(thoughts.len(), 1);
    assert_eq!(thoughts[0].thought_type, ThoughtType::Decision);
    assert_eq!(thoughts[0].content, reply);

    let streamed = stream.try_recv().unwrap();
    assert_eq!(streamed.content, reply);
}

#[tokio::test]
async fn feeling_reaches_the_system_prompt() {
    let (mock, config) = common::spawn(Script::default()).await;
    let (brain, _stream) = brain_for(&config, Personality::default(), &BrainConfig::default());

    let feeling = Feeling {
        mood: MoodLabel::Sad,
        influence: MoodInfluence {
            impulsivity: 0.0,
            sociability: -0.6,
            risk_aversion: 0.6,
            assertiveness: -0.4,
        },
        emotions: vec![EmotionKind::Loneliness],
    };
    brain
        .think(&CancellationToken::new(), "Ada", &feeling, &[], &[ChatMessage::user("hi")])
        .await
        .unwrap();

    let system = mock.bodies()[0]["messages"][0]["content"].as_str().unwrap().to_owned();
    assert!(system.contains("you feel sad"));
    assert!(system.contains("Strongest feelings: loneliness."));
    assert!(system.contains("you would rather keep to yourself"));
    assert!(system.contains("you are inclined to hold back and defer"));
    assert!(system.contains("you steer clear of anything uncertain"));
}

#[tokio::test]
async fn failure_leaves_thoughts_untouched() {
    let (_mock, config) = common::spawn(Script {
        failures: usize::MAX,
        fail_status: StatusCode::BAD_GATEWAY,
        ..Script::default()
    })
    .await;
    let (brain, mut stream) = brain_for(&config, Personality::default(), &BrainConfig::default());

    let result = brain
        .think(&CancellationToken::new(), "Ada", &neutral(), &[], &[ChatMessage::user("hi")])
        .await;

    assert!(matches!(result, Err(GatewayError::Status { status: 502, .. })));
    assert!(brain.recent_thoughts().is_empty());
    assert!(stream.try_recv().is_err());
}

#[tokio::test]
async fn buffer_evicts_oldest_and_stream_drops_when_full() {
    let (_mock, config) = common::spawn(Script::default()).await;
    let brain_config = BrainConfig {
        max_thoughts: 2,
        thought_stream_capacity: 1,
    };
    let (brain, mut stream) = brain_for(&config, Personality::default(), &brain_config);

    let cancel = CancellationToken::new();
    for turn in 0..3 {
        let history = vec![ChatMessage::user("hi"); turn + 1];
        brain
            .think(&cancel, "Ada", &neutral(), &[], &history)
            .await
            .unwrap();
    }

    let thoughts = brain.recent_thoughts();
    assert_eq!(thoughts.len(), 2);
    assert_eq!(thoughts[0].triggers, ["conversation:2"]);
    assert_eq!(thoughts[1].triggers, ["conversation:3"]);

    // Only the first thought fit in the stream; the rest were dropped.
    assert_eq!(stream.try_recv().unwrap().triggers, ["conversation:1"]);
    assert!(stream.try_recv().is_err());
}

#[tokio::test]
async fn closed_stream_does_not_fail_the_cycle() {
    let (_mock, config) = common::spawn(Script::default()).await;
    let (brain, stream) = brain_for(&config, Personality::default(), &BrainConfig::default());
    drop(stream);

    let result = brain
        .think(&CancellationToken::new(), "Ada", &neutral(), &[], &[ChatMessage::user("hi")])
        .await;
    assert!(result.is_ok());
    assert_eq!(brain.recent_thoughts().len(), 1);
}
