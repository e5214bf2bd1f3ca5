// src/watch/debounce.rs

//! Per-task trailing debounce.
//!
//! Every matching filesystem event pushes the task's deadline to
//! `now + window`; the task fires once no event for it arrived within the
//! window. Time is passed in, so the debouncer itself is pure.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::engine::TaskName;

#[derive(Debug, Clone)]
pub struct TaskDebouncer {
    window: Duration,
    deadlines: HashMap<TaskName, Instant>,
}

impl TaskDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Record an event for `task` at `now`.
    pub fn push(&mut self, task: &str, now: Instant) {
        self.deadlines.insert(task.to_string(), now + self.window);
    }

    /// Tasks whose deadline has passed, sorted by name.
    pub fn take_ready(&mut self, now: Instant) -> Vec<TaskName> {
        let mut ready: Vec<TaskName> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(task, _)| task.clone())
            .collect();
        for task in ready.iter() {
            self.deadlines.remove(task);
        }
        ready.sort();
        ready
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
