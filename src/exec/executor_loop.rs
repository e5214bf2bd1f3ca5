// src/exec/executor_loop.rs

//! Main executor loop that manages running task invocations.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::engine::{RuntimeEvent, ScheduledTask, TaskName};
use crate::exec::task_runner::run_scheduled;
use crate::orchestrator::Orchestrator;

/// Handle for one in-flight invocation.
///
/// - `cancel` asks the runner to drop the pipeline future, which kills any
///   external tool it spawned.
/// - `handle` is the Tokio task driving the pipeline.
struct ActiveTask {
    run_id: u64,
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own Tokio task. The loop does not decide
/// *whether* to run; the engine core already did. It only honours
/// `cancel_previous` by stopping older invocations of the same task first.
pub fn spawn_executor(
    orchestrator: Arc<Orchestrator>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<TaskName, Vec<ActiveTask>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &mut active, &orchestrator, &runtime_tx);
        }

        debug!("executor loop finished (channel closed)");
    });

    tx
}

fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<TaskName, Vec<ActiveTask>>,
    orchestrator: &Arc<Orchestrator>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let instances = active.entry(task.name.clone()).or_default();
    instances.retain(|a| !a.handle.is_finished());

    if task.cancel_previous {
        for mut previous in instances.drain(..) {
            cancel_instance(&task, &mut previous);
        }
    }

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(run_scheduled(
        orchestrator.clone(),
        task.clone(),
        runtime_tx.clone(),
        cancel_rx,
    ));

    instances.push(ActiveTask {
        run_id: task.run_id,
        cancel: Some(cancel_tx),
        handle,
    });
}

fn cancel_instance(task: &ScheduledTask, previous: &mut ActiveTask) {
    info!(
        task = %task.name,
        cancelled_run = previous.run_id,
        run_id = task.run_id,
        "cancelling previous invocation"
    );

    if let Some(cancel) = previous.cancel.take() {
        if cancel.send(()).is_err() {
            debug!(
                task = %task.name,
                run_id = previous.run_id,
                "previous invocation already finished while cancelling"
            );
        }
    }
}
