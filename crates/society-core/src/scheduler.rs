//! Tick issuance: one conversation per tick.
//!
//! A single interval drives the scheduler. On every tick the counter
//! advances and a conversation task is spawned; ticks never wait for each
//! other, so a slow conversation can overlap the next ones.
//!
//! The operator can pause issuance, change the interval, or request a
//! clean stop through [`OperatorState`]. Cancelling the token passed to
//! [`Scheduler::run`] is a hard stop: issuance ends and every in-flight
//! conversation sees a child token fire.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use society_types::{AgentId, AgentRecord};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::{ClockError, TickClock};
use crate::config::{ParticipationPolicy, WorldConfig};
use crate::conversation::{
    ConversationContext, ConversationOutcome, ConversationPlan, SkipReason, run_conversation,
};
use crate::operator::{MIN_TICK_INTERVAL_MS, OperatorState};

type BusySet = Arc<Mutex<HashSet<AgentId>>>;

/// Marks a pair of agents as conversing until dropped.
struct BusyClaim {
    busy: BusySet,
    agents: [AgentId; 2],
}

impl BusyClaim {
    /// Claim both agents, or neither if either is already busy.
    fn acquire(busy: &BusySet, agents: [AgentId; 2]) -> Option<Self> {
        let mut set = busy.lock().unwrap_or_else(PoisonError::into_inner);
        if agents.iter().any(|id| set.contains(id)) {
            return None;
        }
        set.extend(agents);
        Some(Self {
            busy: Arc::clone(busy),
            agents,
        })
    }
}

impl Drop for BusyClaim {
    fn drop(&mut self) {
        let mut set = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        for id in &self.agents {
            set.remove(id);
        }
    }
}

/// Drives conversations on a fixed tick.
pub struct Scheduler {
    ctx: Arc<ConversationContext>,
    operator: Arc<OperatorState>,
    clock: Arc<TickClock>,
    turns_per_conversation: u32,
    policy: ParticipationPolicy,
    busy: BusySet,
}

impl Scheduler {
    /// Create a scheduler.
    pub fn new(
        ctx: ConversationContext,
        operator: Arc<OperatorState>,
        clock: Arc<TickClock>,
        world: &WorldConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(ctx),
            operator,
            clock,
            turns_per_conversation: world.turns_per_conversation,
            policy: world.participation,
            busy: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Shared operator controls.
    pub const fn operator(&self) -> &Arc<OperatorState> {
        &self.operator
    }

    /// Shared tick counter.
    pub const fn clock(&self) -> &Arc<TickClock> {
        &self.clock
    }

    /// Issue one tick immediately and spawn its conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter is
    /// exhausted.
    pub fn issue_tick(
        &self,
        cancel: &CancellationToken,
    ) -> Result<JoinHandle<ConversationOutcome>, ClockError> {
        let task = self.tick_task(cancel)?;
        Ok(tokio::spawn(task))
    }

    /// Run until `cancel` fires or the operator requests a stop, then wait
    /// for running conversations to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut tasks: JoinSet<ConversationOutcome> = JoinSet::new();
        let mut period_ms = self.operator.tick_interval_ms();
        let mut ticker = new_ticker(period_ms);

        info!(
            tick_interval_ms = period_ms,
            turns_per_conversation = self.turns_per_conversation,
            policy = ?self.policy,
            "scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.operator.stopped() => {
                    info!("operator requested stop");
                    break;
                }
                Some(joined) = tasks.join_next() => {
                    log_outcome(joined);
                    continue;
                }
                _ = ticker.tick() => {}
            }

            if self.operator.is_paused() {
                info!("scheduler paused");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = self.operator.stopped() => break,
                    () = self.operator.wait_if_paused() => {}
                }
                info!("scheduler resumed");
                period_ms = self.operator.tick_interval_ms();
                ticker = new_ticker(period_ms);
                continue;
            }

            let current = self.operator.tick_interval_ms();
            if current != period_ms {
                info!(from_ms = period_ms, to_ms = current, "tick interval changed");
                period_ms = current;
                ticker = new_ticker(period_ms);
            }

            match self.tick_task(&cancel) {
                Ok(task) => {
                    tasks.spawn(task);
                }
                Err(e) => {
                    error!(error = %e, "scheduler cannot advance");
                    break;
                }
            }
        }

        info!(running = tasks.len(), "scheduler stopping, waiting for conversations");
        while let Some(joined) = tasks.join_next().await {
            log_outcome(joined);
        }
        info!(tick = self.clock.current(), "scheduler stopped");
    }

    fn tick_task(
        &self,
        cancel: &CancellationToken,
    ) -> Result<impl Future<Output = ConversationOutcome> + Send + 'static, ClockError> {
        let tick = self.clock.advance()?;
        debug!(tick, "tick issued");

        let ctx = Arc::clone(&self.ctx);
        let busy = Arc::clone(&self.busy);
        let active = self.operator.track_conversation();
        let policy = self.policy;
        let turns = self.turns_per_conversation;
        let cancel = cancel.child_token();

        Ok(async move {
            let _active = active;

            let (initiator, responder) = match select_pair(&ctx, tick).await {
                Ok(pair) => pair,
                Err(reason) => return ConversationOutcome::Skipped(reason),
            };

            let _claim = match policy {
                ParticipationPolicy::AllowOverlap => None,
                ParticipationPolicy::ExclusivePerAgent => {
                    let claim = BusyClaim::acquire(&busy, [initiator.id, responder.id]);
                    if claim.is_none() {
                        debug!(tick, "selected agent already conversing, tick skipped");
                        return ConversationOutcome::Skipped(SkipReason::ParticipantBusy);
                    }
                    claim
                }
            };

            let plan = ConversationPlan {
                tick,
                initiator,
                responder,
                turns,
            };
            run_conversation(&ctx, plan, cancel).await
        })
    }
}

async fn select_pair(
    ctx: &ConversationContext,
    tick: u64,
) -> Result<(AgentRecord, AgentRecord), SkipReason> {
    let agents = ctx.repository.random_active_agents(2).await.map_err(|e| {
        warn!(tick, error = %e, "failed to select agents");
        SkipReason::Repository(e.to_string())
    })?;

    let available = agents.len();
    let mut agents = agents.into_iter();
    match (agents.next(), agents.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => {
            debug!(tick, available, "not enough active agents, tick skipped");
            Err(SkipReason::InsufficientAgents { available })
        }
    }
}

fn new_ticker(period_ms: u64) -> Interval {
    let period = Duration::from_millis(period_ms.max(MIN_TICK_INTERVAL_MS));
    let start = Instant::now()
        .checked_add(period)
        .unwrap_or_else(Instant::now);
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Abandonment and cancellation were already reported by the
/// conversation itself; only a panicked task is new information here.
fn log_outcome(joined: Result<ConversationOutcome, JoinError>) {
    match joined {
        Ok(outcome) => debug!(?outcome, "conversation task finished"),
        Err(e) => error!(error = %e, "conversation task failed"),
    }
}
