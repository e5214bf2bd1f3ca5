// src/engine/slots.rs

//! Per-task invocation bookkeeping.

use std::collections::{BTreeSet, HashMap};

use crate::engine::TaskName;

#[derive(Debug, Clone, Default)]
struct Slot {
    /// Run ids of invocations that are in flight.
    active: BTreeSet<u64>,
    /// A re-run was requested while the task was busy.
    pending: bool,
}

/// Read-only view of one task's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unknown,
    Idle,
    Running { instances: usize, pending: bool },
}

/// In-flight invocations and pending re-runs for every known task.
#[derive(Debug, Clone, Default)]
pub struct TaskSlots {
    slots: HashMap<TaskName, Slot>,
    next_run_id: u64,
}

impl TaskSlots {
    pub fn new<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            slots: tasks
                .into_iter()
                .map(|t| (t.into(), Slot::default()))
                .collect(),
            next_run_id: 1,
        }
    }

    pub fn knows(&self, task: &str) -> bool {
        self.slots.contains_key(task)
    }

    pub fn state_of(&self, task: &str) -> SlotState {
        match self.slots.get(task) {
            None => SlotState::Unknown,
            Some(slot) if slot.active.is_empty() => SlotState::Idle,
            Some(slot) => SlotState::Running {
                instances: slot.active.len(),
                pending: slot.pending,
            },
        }
    }

    pub fn is_running(&self, task: &str) -> bool {
        self.slots.get(task).is_some_and(|s| !s.active.is_empty())
    }

    /// No invocation is in flight and nothing is pending.
    pub fn is_idle(&self) -> bool {
        self.slots
            .values()
            .all(|s| s.active.is_empty() && !s.pending)
    }

    /// Register a new invocation and return its run id.
    pub fn start(&mut self, task: &str) -> u64 {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.slots
            .entry(task.to_string())
            .or_default()
            .active
            .insert(run_id);
        run_id
    }

    /// Mark `run_id` finished. Returns `false` for invocations that were
    /// already cancelled (or never existed).
    pub fn finish(&mut self, task: &str, run_id: u64) -> bool {
        self.slots
            .get_mut(task)
            .is_some_and(|s| s.active.remove(&run_id))
    }

    /// Forget every in-flight invocation of `task`; returns how many.
    pub fn cancel_all(&mut self, task: &str) -> usize {
        match self.slots.get_mut(task) {
            Some(slot) => {
                let n = slot.active.len();
                slot.active.clear();
                n
            }
            None => 0,
        }
    }

    /// Request a re-run; returns `true` if one was already pending.
    pub fn set_pending(&mut self, task: &str) -> bool {
        let slot = self.slots.entry(task.to_string()).or_default();
        std::mem::replace(&mut slot.pending, true)
    }

    pub fn take_pending(&mut self, task: &str) -> bool {
        self.slots
            .get_mut(task)
            .is_some_and(|s| std::mem::take(&mut s.pending))
    }
}
