//! One conversation between two agents.
//!
//! The initiator opens with an observational prompt about its partner, then
//! the two alternate for a fixed number of turns. Each agent keeps its own
//! transcript: its own replies appear as `assistant` entries and the
//! partner's replies as attributed `user` entries.
//!
//! Per turn:
//!
//! 1. Pending injections for the speaker are drained into its transcript
//!    and appraised as a human message.
//! 2. The speaker's mind settles its affect state and runs a cognitive
//!    cycle.
//! 3. The reply is appended to both transcripts and the listener appraises
//!    it as social contact.
//! 4. The turn is persisted and broadcast (both best-effort), and the
//!    speaker's mood is saved (best-effort).
//!
//! A failed cognitive cycle ends the conversation immediately.

use std::sync::Arc;

use society_agents::Stimulus;
use society_runner::{ChatMessage, PromptEngine};
use society_types::{AgentId, AgentRecord, ConversationEvent, ConversationTurn, ObserverEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::hub::Hub;
use crate::mind::{AgentMind, MindRegistry};
use crate::repository::Repository;

/// Shared services a conversation needs.
pub struct ConversationContext {
    /// Observer fan-out and injection queue.
    pub hub: Arc<Hub>,
    /// Turn and mood persistence.
    pub repository: Arc<dyn Repository>,
    /// Per-agent minds.
    pub minds: Arc<MindRegistry>,
    /// Prompt fragments for openings, injections, and attributions.
    pub prompts: Arc<PromptEngine>,
}

/// The pair and length chosen for one tick.
#[derive(Debug, Clone)]
pub struct ConversationPlan {
    /// Tick that issued the conversation.
    pub tick: u64,
    /// Agent that speaks first.
    pub initiator: AgentRecord,
    /// Agent being approached.
    pub responder: AgentRecord,
    /// Number of turns to exchange.
    pub turns: u32,
}

/// Why a tick produced no conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two active agents were available.
    InsufficientAgents {
        /// How many were returned.
        available: usize,
    },
    /// An agent of the pair is already conversing and overlap is disallowed.
    ParticipantBusy,
    /// Selecting the pair failed.
    Repository(String),
}

/// How a conversation task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationOutcome {
    /// Every planned turn was produced.
    Completed {
        /// Turns produced.
        turns: u32,
    },
    /// A turn failed and the rest were dropped.
    Abandoned {
        /// Turns produced before the failure.
        turns: u32,
        /// What went wrong.
        reason: String,
    },
    /// The scheduler was cancelled mid-conversation.
    Cancelled {
        /// Turns produced before cancellation.
        turns: u32,
    },
    /// No conversation was started.
    Skipped(SkipReason),
}

impl ConversationOutcome {
    /// Turns produced, zero for a skipped tick.
    pub const fn turns(&self) -> u32 {
        match self {
            Self::Completed { turns } | Self::Abandoned { turns, .. } | Self::Cancelled { turns } => {
                *turns
            }
            Self::Skipped(_) => 0,
        }
    }
}

/// One participant's view of the conversation.
struct Side {
    id: AgentId,
    name: String,
    mind: Arc<AgentMind>,
    history: Vec<ChatMessage>,
}

/// Run a conversation to completion, failure, or cancellation.
pub async fn run_conversation(
    ctx: &ConversationContext,
    plan: ConversationPlan,
    cancel: CancellationToken,
) -> ConversationOutcome {
    let tick = plan.tick;
    let (mut initiator, mut responder) = match prepare(ctx, &plan) {
        Ok(sides) => sides,
        Err(reason) => {
            warn!(tick, reason = %reason, "conversation could not start");
            return ConversationOutcome::Abandoned { turns: 0, reason };
        }
    };

    info!(
        tick,
        initiator = %initiator.name,
        responder = %responder.name,
        turns = plan.turns,
        "conversation started"
    );

    let mut speaker = &mut initiator;
    let mut listener = &mut responder;
    let mut produced: u32 = 0;

    while produced < plan.turns {
        if cancel.is_cancelled() {
            return cancelled(tick, produced);
        }

        if let Err(reason) = deliver_injections(ctx, speaker) {
            return abandoned(tick, produced, reason);
        }

        let reply = match speaker.mind.respond(&cancel, &speaker.history).await {
            Ok(reply) => reply,
            Err(e) if e.is_cancellation() => return cancelled(tick, produced),
            Err(e) => return abandoned(tick, produced, e.to_string()),
        };

        let attributed = match ctx.prompts.attribution(&speaker.name, &reply) {
            Ok(text) => text,
            Err(e) => return abandoned(tick, produced, e.to_string()),
        };
        speaker.history.push(ChatMessage::assistant(reply.clone()));
        listener.history.push(ChatMessage::user(attributed));
        listener
            .mind
            .appraise(&Stimulus::social_contact(&speaker.name));

        record_turn(ctx, speaker, listener, reply, tick).await;

        produced = produced.saturating_add(1);
        std::mem::swap(&mut speaker, &mut listener);
    }

    info!(tick, turns = produced, "conversation completed");
    ConversationOutcome::Completed { turns: produced }
}

fn prepare(ctx: &ConversationContext, plan: &ConversationPlan) -> Result<(Side, Side), String> {
    let side = |record: &AgentRecord| -> Result<Side, String> {
        let mind = ctx
            .minds
            .mind_for(record)
            .map_err(|e| format!("agent {}: {e}", record.id))?;
        Ok(Side {
            id: record.id,
            name: record.name.clone(),
            mind,
            history: Vec::new(),
        })
    };

    let mut initiator = side(&plan.initiator)?;
    let responder = side(&plan.responder)?;

    let opening = ctx
        .prompts
        .opening(&responder.name)
        .map_err(|e| e.to_string())?;
    initiator.history.push(ChatMessage::user(opening));
    Ok((initiator, responder))
}

fn deliver_injections(ctx: &ConversationContext, speaker: &mut Side) -> Result<(), String> {
    for message in ctx.hub.drain_injections(speaker.id) {
        let framed = ctx.prompts.injection(&message).map_err(|e| e.to_string())?;
        speaker.history.push(ChatMessage::user(framed));
        speaker.mind.appraise(&Stimulus::human_message());
        debug!(agent_id = %speaker.id, "injection delivered");
    }
    Ok(())
}

async fn record_turn(
    ctx: &ConversationContext,
    speaker: &Side,
    listener: &Side,
    reply: String,
    tick: u64,
) {
    let turn = ConversationTurn::new(speaker.id, listener.id, reply, tick);
    if let Err(e) = ctx.repository.save_conversation_turn(&turn).await {
        warn!(tick, speaker = %speaker.name, error = %e, "failed to persist conversation turn");
    }

    let delivered = ctx
        .hub
        .broadcast(&ObserverEvent::Conversation(ConversationEvent {
            speaker_name: speaker.name.clone(),
            target_name: listener.name.clone(),
            content: turn.content,
            agent_id: speaker.id,
            tick,
        }));
    debug!(tick, speaker = %speaker.name, delivered, "turn broadcast");

    if let Err(e) = ctx
        .repository
        .save_mood(speaker.id, &speaker.mind.snapshot())
        .await
    {
        warn!(agent_id = %speaker.id, error = %e, "failed to save mood");
    }
}

fn abandoned(tick: u64, turns: u32, reason: String) -> ConversationOutcome {
    warn!(tick, turns, reason = %reason, "conversation abandoned");
    ConversationOutcome::Abandoned { turns, reason }
}

fn cancelled(tick: u64, turns: u32) -> ConversationOutcome {
    info!(tick, turns, "conversation cancelled");
    ConversationOutcome::Cancelled { turns }
}
