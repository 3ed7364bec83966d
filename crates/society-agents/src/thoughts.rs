//! Fixed-capacity working-thought buffer.

use std::collections::VecDeque;

use society_types::Thought;

/// Bounded FIFO of an agent's most recent thoughts.
///
/// Pushing into a full buffer evicts the oldest thought, so the length
/// never exceeds the capacity.
#[derive(Debug, Clone)]
pub struct ThoughtBuffer {
    capacity: usize,
    thoughts: VecDeque<Thought>,
}

impl ThoughtBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            thoughts: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a thought, returning the evicted oldest thought if the buffer
    /// was full.
    pub fn push(&mut self, thought: Thought) -> Option<Thought> {
        let evicted = if self.thoughts.len() >= self.capacity {
            self.thoughts.pop_front()
        } else {
            None
        };
        self.thoughts.push_back(thought);
        evicted
    }

    /// Number of buffered thoughts.
    pub fn len(&self) -> usize {
        self.thoughts.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty()
    }

    /// Maximum number of thoughts retained.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Thought> {
        self.thoughts.iter()
    }

    /// Clone the buffer contents, oldest first.
    pub fn to_vec(&self) -> Vec<Thought> {
        self.thoughts.iter().cloned().collect()
    }
}
