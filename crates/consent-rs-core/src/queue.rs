//! FIFO queue of requests waiting for the prompt slot.

use std::collections::VecDeque;

/// Strict first-in, first-out queue.
///
/// Holds no locks of its own; the coordinator guards it together with the
/// rest of its state.
#[derive(Debug)]
pub struct RequestQueue<T> {
    items: VecDeque<T>,
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append to the tail.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove and return the head, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Inspect the head without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
