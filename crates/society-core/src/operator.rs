//! Operator control state for runtime scheduler management.
//!
//! Shared between the scheduler loop and the operator REST API. The
//! operator can pause and resume tick issuance, change the tick interval,
//! and request a clean stop without restarting the process.
//!
//! All mutable control fields are atomics so the scheduler reads them
//! without taking locks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Smallest tick interval the operator may set, in milliseconds.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether tick issuance is paused.
    paused: AtomicBool,

    /// Wakes the scheduler when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the scheduler when a stop is requested.
    stop_notify: Notify,

    /// Current tick interval in milliseconds.
    tick_interval_ms: AtomicU64,

    /// Conversations currently running.
    active_conversations: AtomicUsize,

    /// Wall-clock time the scheduler was created.
    started_at: DateTime<Utc>,
}

impl OperatorState {
    /// Create operator state with the configured tick interval.
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms.max(MIN_TICK_INTERVAL_MS)),
            active_conversations: AtomicUsize::new(0),
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether tick issuance is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause tick issuance. Running conversations are not interrupted.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume tick issuance and wake the scheduler.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until tick issuance is no longer paused.
    ///
    /// Returns immediately if not paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The scheduler stops issuing ticks and waits
    /// for running conversations.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested.
    pub async fn stopped(&self) {
        while !self.stop_requested.load(Ordering::Acquire) {
            self.stop_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds. Must be at least
    /// [`MIN_TICK_INTERVAL_MS`].
    ///
    /// Returns the previous interval, or `None` if the value was rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    /// Count a conversation as running until the guard is dropped.
    pub fn track_conversation(self: &Arc<Self>) -> ConversationGuard {
        self.active_conversations.fetch_add(1, Ordering::AcqRel);
        ConversationGuard(Arc::clone(self))
    }

    /// Conversations currently running.
    pub fn active_conversations(&self) -> usize {
        self.active_conversations.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Snapshot the control state for the operator API.
    pub fn status(&self, tick: u64) -> SchedulerStatus {
        SchedulerStatus {
            tick,
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            active_conversations: self.active_conversations(),
            elapsed_seconds: self.elapsed_seconds(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// Decrements the running-conversation count when dropped.
#[derive(Debug)]
pub struct ConversationGuard(Arc<OperatorState>);

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        self.0.active_conversations.fetch_sub(1, Ordering::AcqRel);
    }
}

/// JSON-serializable scheduler status for the operator API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Most recently issued tick.
    pub tick: u64,
    /// Whether tick issuance is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Conversations currently running.
    pub active_conversations: usize,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// RFC 3339 timestamp of when the scheduler started.
    pub started_at: String,
}
