// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strict FIFO backlog of pending requests
//!
//! There is no priority and no reordering: the head is always the oldest
//! request that has not yet been taken.

use std::collections::VecDeque;

/// Ordered backlog of requests waiting for the connection
#[derive(Debug)]
pub struct CommandQueue<T> {
    items: VecDeque<T>,
    enqueued: u64,
}

impl<T> CommandQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            enqueued: 0,
        }
    }

    /// Append at the tail; returns the request's arrival position (starting at 1)
    pub fn push(&mut self, item: T) -> u64 {
        self.items.push_back(item);
        self.enqueued += 1;
        self.enqueued
    }

    /// Take the oldest request
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total requests ever pushed
    pub fn enqueued(&self) -> u64 {
        self.enqueued
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
