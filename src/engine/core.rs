// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use crate::engine::event_handlers::{CoreStep, handle_task_completion, handle_task_trigger};
use crate::engine::slots::{SlotState, TaskSlots};
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    slots: TaskSlots,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new<I, S>(tasks: I, options: RuntimeOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            slots: TaskSlots::new(tasks),
            options,
        }
    }

    /// Nothing running and nothing pending.
    pub fn is_idle(&self) -> bool {
        self.slots.is_idle()
    }

    pub fn state_of(&self, task: &str) -> SlotState {
        self.slots.state_of(task)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.slots, &self.options, task, reason)
            }
            RuntimeEvent::TaskCompleted {
                task,
                run_id,
                outcome,
            } => handle_task_completion(&mut self.slots, &self.options, task, run_id, outcome),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        CoreCommand, OverlapBehaviour, ScheduledTask, TaskOutcome, TriggerReason,
    };

    fn core(overlap: OverlapBehaviour) -> CoreRuntime {
        CoreRuntime::new(
            ["css-task", "js-task"],
            RuntimeOptions {
                overlap,
                exit_when_idle: false,
            },
        )
    }

    fn trigger(task: &str) -> RuntimeEvent {
        RuntimeEvent::TaskTriggered {
            task: task.to_string(),
            reason: TriggerReason::FileWatch,
        }
    }

    fn done(task: &str, run_id: u64) -> RuntimeEvent {
        RuntimeEvent::TaskCompleted {
            task: task.to_string(),
            run_id,
            outcome: TaskOutcome::Success,
        }
    }

    fn dispatched(step: &CoreStep) -> Vec<ScheduledTask> {
        step.commands
            .iter()
            .flat_map(|c| match c {
                CoreCommand::DispatchTasks(t) => t.clone(),
                CoreCommand::RequestExit => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn queue_coalesces_triggers_into_one_rerun() {
        let mut core = core(OverlapBehaviour::Queue);

        let first = dispatched(&core.step(trigger("css-task")));
        assert_eq!(first.len(), 1);
        assert!(dispatched(&core.step(trigger("css-task"))).is_empty());
        assert!(dispatched(&core.step(trigger("css-task"))).is_empty());

        let rerun = dispatched(&core.step(done("css-task", first[0].run_id)));
        assert_eq!(rerun.len(), 1);
        assert!(!rerun[0].cancel_previous);

        assert!(dispatched(&core.step(done("css-task", rerun[0].run_id))).is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn cancel_restarts_and_ignores_stale_completion() {
        let mut core = core(OverlapBehaviour::Cancel);

        let first = dispatched(&core.step(trigger("js-task")));
        let second = dispatched(&core.step(trigger("js-task")));
        assert_eq!(second.len(), 1);
        assert!(second[0].cancel_previous);

        assert!(dispatched(&core.step(done("js-task", first[0].run_id))).is_empty());
        assert!(!core.is_idle());

        core.step(done("js-task", second[0].run_id));
        assert!(core.is_idle());
    }

    #[test]
    fn overlap_runs_every_trigger() {
        let mut core = core(OverlapBehaviour::Overlap);

        core.step(trigger("css-task"));
        core.step(trigger("css-task"));
        assert_eq!(
            core.state_of("css-task"),
            SlotState::Running {
                instances: 2,
                pending: false
            }
        );
    }

    #[test]
    fn unknown_task_is_ignored() {
        let mut core = core(OverlapBehaviour::Queue);
        let step = core.step(trigger("nope"));
        assert!(step.commands.is_empty());
        assert!(step.keep_running);
    }

    #[test]
    fn exit_when_idle_after_last_completion() {
        let mut core = CoreRuntime::new(
            ["a"],
            RuntimeOptions {
                overlap: OverlapBehaviour::Queue,
                exit_when_idle: true,
            },
        );
        let first = dispatched(&core.step(trigger("a")));
        let step = core.step(done("a", first[0].run_id));
        assert!(!step.keep_running);
        assert!(step.commands.contains(&CoreCommand::RequestExit));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = core(OverlapBehaviour::Queue);
        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
