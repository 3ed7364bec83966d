//! Monotonic tick counter shared by the scheduler and the observer.
//!
//! Ticks are counted from 1; a value of 0 means no tick has been issued.

use std::sync::atomic::{AtomicU64, Ordering};

/// Errors that can occur while advancing the clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Lock-free tick counter.
#[derive(Debug, Default)]
pub struct TickClock {
    tick: AtomicU64,
}

impl TickClock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self {
            tick: AtomicU64::new(0),
        }
    }

    /// Advance by one tick and return the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter is already at
    /// `u64::MAX`.
    pub fn advance(&self) -> Result<u64, ClockError> {
        self.tick
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| t.checked_add(1))
            .map_err(|_| ClockError::TickOverflow)
            .and_then(|prev| prev.checked_add(1).ok_or(ClockError::TickOverflow))
    }

    /// The most recently issued tick.
    pub fn current(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }
}
