// src/exec/task_runner.rs

//! Runs one scheduled invocation and reports its outcome.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, ScheduledTask, TaskOutcome};
use crate::orchestrator::Orchestrator;

/// Run `task` through the orchestrator and send `TaskCompleted`.
///
/// If the cancel channel fires first, the pipeline future is dropped (killing
/// any external tool via `kill_on_drop`) and **no** `TaskCompleted` is sent
/// for that instance.
pub async fn run_scheduled(
    orchestrator: Arc<Orchestrator>,
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let run = orchestrator.run_task(&task.name);
    tokio::pin!(run);

    let result = tokio::select! {
        res = &mut run => res,
        Ok(()) = &mut cancel_rx => {
            info!(task = %task.name, run_id = task.run_id, "invocation cancelled");
            return;
        }
    };

    // Failures were already logged by the orchestrator.
    let outcome = match result {
        Ok(_) => TaskOutcome::Success,
        Err(_) => TaskOutcome::Failed,
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            run_id: task.run_id,
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %task.name, "runtime gone; completion dropped");
    }
}
