// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, warn};

use crate::engine::slots::TaskSlots;
use crate::engine::{
    OverlapBehaviour, RuntimeOptions, ScheduledTask, TaskName, TaskOutcome, TriggerReason,
};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these invocations to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the process exits (`exit_when_idle` and nothing left).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - An idle task starts immediately.
/// - A busy task follows `options.overlap`:
///   - `Queue`: remember one pending re-run (further triggers coalesce).
///   - `Cancel`: drop the in-flight invocations and start a new one.
///   - `Overlap`: start another invocation alongside the running one.
pub fn handle_task_trigger(
    slots: &mut TaskSlots,
    options: &RuntimeOptions,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    if !slots.knows(&task) {
        warn!(task = %task, "trigger for unknown task ignored");
        return CoreStep::running(Vec::new());
    }

    if !slots.is_running(&task) {
        let run_id = slots.start(&task);
        debug!(task = %task, run_id, ?reason, "starting task");
        return CoreStep::running(vec![dispatch(task, run_id, false)]);
    }

    let commands = match options.overlap {
        OverlapBehaviour::Queue => {
            if slots.set_pending(&task) {
                debug!(task = %task, "re-run already pending; trigger coalesced");
            } else {
                debug!(task = %task, "task busy; re-run queued");
            }
            Vec::new()
        }
        OverlapBehaviour::Cancel => {
            let cancelled = slots.cancel_all(&task);
            let run_id = slots.start(&task);
            debug!(task = %task, run_id, cancelled, "restarting task");
            vec![dispatch(task, run_id, true)]
        }
        OverlapBehaviour::Overlap => {
            let run_id = slots.start(&task);
            debug!(task = %task, run_id, "starting overlapping invocation");
            vec![dispatch(task, run_id, false)]
        }
    };

    CoreStep::running(commands)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    slots: &mut TaskSlots,
    options: &RuntimeOptions,
    task: TaskName,
    run_id: u64,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    if !slots.finish(&task, run_id) {
        debug!(task = %task, run_id, "completion of a cancelled invocation ignored");
    } else {
        debug!(task = %task, run_id, ?outcome, "invocation finished");
        if !slots.is_running(&task) && slots.take_pending(&task) {
            let next = slots.start(&task);
            debug!(task = %task, run_id = next, "starting queued re-run");
            commands.push(dispatch(task, next, false));
        }
    }

    let mut keep_running = true;
    if options.exit_when_idle && slots.is_idle() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

fn dispatch(name: TaskName, run_id: u64, cancel_previous: bool) -> CoreCommand {
    CoreCommand::DispatchTasks(vec![ScheduledTask {
        name,
        run_id,
        cancel_previous,
    }])
}
