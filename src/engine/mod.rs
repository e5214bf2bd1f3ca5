// src/engine/mod.rs

//! Watch-mode engine.
//!
//! This module ties together:
//! - per-task run slots (what happens when triggers arrive while a task is
//!   still running, see [`OverlapBehaviour`])
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Outcome of a task invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Triggered due to a filesystem event.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    pub overlap: OverlapBehaviour,
    /// If true, exit the runtime once no task is running or pending.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from watchers, executors, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should be (re-)run.
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    /// An invocation finished. Cancelled invocations never report.
    TaskCompleted {
        task: TaskName,
        run_id: u64,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// One invocation the core wants the executor to start now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// Monotonically increasing invocation id, unique across tasks.
    pub run_id: u64,
    /// Stop every in-flight invocation of this task before starting.
    pub cancel_previous: bool,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod slots;

pub use crate::types::OverlapBehaviour;
pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use slots::{SlotState, TaskSlots};
