// src/watch/watcher.rs

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::watch::debounce::TaskDebouncer;
use crate::watch::event_handler::{EventRouter, is_relevant};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher on `watch_dir` (recursively) that sends
/// `RuntimeEvent::TaskTriggered` for every task the router maps a change to,
/// after the debounce window.
pub fn spawn_watcher(
    watch_dir: impl Into<PathBuf>,
    router: EventRouter,
    debouncer: TaskDebouncer,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let watch_dir = watch_dir.into();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch loop gone; dropping notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&watch_dir, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", watch_dir.display()))?;

    info!(dir = %watch_dir.display(), "file watcher started");

    tokio::spawn(watch_loop(event_rx, router, debouncer, runtime_tx));

    Ok(WatcherHandle { _inner: watcher })
}

async fn watch_loop(
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    mut router: EventRouter,
    mut debouncer: TaskDebouncer,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    loop {
        let deadline = debouncer.next_deadline();

        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { break };
                if !is_relevant(&event.kind) {
                    continue;
                }
                let now = Instant::now();
                let (routed, tasks) = match route_paths(router, event.paths).await {
                    Ok(routed) => routed,
                    Err(err) => {
                        warn!(error = %err, "routing watch event failed; stopping watch loop");
                        return;
                    }
                };
                router = routed;
                for task in tasks {
                    debouncer.push(&task, now);
                }
            }
            _ = sleep_until(deadline), if deadline.is_some() => {}
        }

        for task in debouncer.take_ready(Instant::now()) {
            debug!(task = %task, "debounce elapsed -> triggering task");
            if runtime_tx
                .send(RuntimeEvent::TaskTriggered {
                    task,
                    reason: TriggerReason::FileWatch,
                })
                .await
                .is_err()
            {
                debug!("runtime channel closed; stopping watch loop");
                return;
            }
        }
    }
    debug!("watcher event loop finished");
}

/// Map changed paths to tasks on the blocking pool, since `use_hash` rules
/// read file contents. The router is handed back with the result.
async fn route_paths(
    mut router: EventRouter,
    paths: Vec<PathBuf>,
) -> Result<(EventRouter, Vec<TaskName>), tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || {
        let mut tasks = Vec::new();
        for path in paths.iter() {
            tasks.extend(router.tasks_for_path(path));
        }
        (router, tasks)
    })
    .await
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::WatchRuleConfig;
    use crate::fs::MockFileSystem;
    use crate::watch::patterns::WatchRule;

    #[tokio::test]
    async fn routing_keeps_hash_state_between_events() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.html", b"<p>1</p>");
        let rule = WatchRule::compile(&WatchRuleConfig {
            patterns: vec!["src/*.html".to_string()],
            exclude: Vec::new(),
            tasks: vec!["html-task".to_string()],
            use_hash: true,
        })
        .unwrap();
        let router = EventRouter::new("/p", "/p/dist", vec![rule], Arc::new(fs.clone()));
        let path = PathBuf::from("/p/src/index.html");

        let (router, tasks) = route_paths(router, vec![path.clone()]).await.unwrap();
        assert_eq!(tasks, vec!["html-task".to_string()]);

        let (router, tasks) = route_paths(router, vec![path.clone()]).await.unwrap();
        assert!(tasks.is_empty());

        fs.add_file(&path, b"<p>2</p>");
        let (_, tasks) = route_paths(router, vec![path]).await.unwrap();
        assert_eq!(tasks, vec!["html-task".to_string()]);
    }
}
