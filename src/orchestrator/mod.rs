// src/orchestrator/mod.rs

//! Task orchestrator.
//!
//! Owns the [`TaskRegistry`], runs single tasks through their pipelines and
//! evaluates [`Composition`] trees. Every finished task (successful or not) is
//! published as a [`TaskCompletion`] on a broadcast channel; subscribers (the
//! dev server wiring, tests) decide what to do with it.

pub mod clean;
pub mod compose;
pub mod registry;

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::{BoxFuture, join_all};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::ConfigFile;
use crate::dag::BuildGraph;
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::pipeline::runner::PipelinePaths;
use crate::pipeline::{TaskReport, run_pipeline};
use crate::types::ReloadKind;

pub use clean::clean_dir;
pub use compose::Composition;
pub use registry::TaskRegistry;

const COMPLETION_CAPACITY: usize = 64;

/// Published once per finished task invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub task: TaskName,
    pub outcome: TaskOutcome,
    pub reload: ReloadKind,
    /// Files written, relative to the output root. Empty on failure.
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    fs: Arc<dyn FileSystem>,
    paths: PipelinePaths,
    completions: broadcast::Sender<TaskCompletion>,
}

impl Orchestrator {
    pub fn new(registry: Arc<TaskRegistry>, fs: Arc<dyn FileSystem>, paths: PipelinePaths) -> Self {
        let (completions, _) = broadcast::channel(COMPLETION_CAPACITY);
        Self {
            registry,
            fs,
            paths,
            completions,
        }
    }

    /// Orchestrator for a validated config rooted at `root`.
    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        let registry = Arc::new(TaskRegistry::from_config(cfg));
        let paths = PipelinePaths::new(root, &cfg.settings().dest);
        Self::new(registry, fs, paths)
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    /// Receive every subsequent [`TaskCompletion`].
    pub fn subscribe(&self) -> broadcast::Receiver<TaskCompletion> {
        self.completions.subscribe()
    }

    /// Run one task to completion.
    pub async fn run_task(&self, name: &str) -> Result<TaskReport> {
        let task = self.registry.get(name)?;
        let result = run_pipeline(self.fs.clone(), &self.paths, name, task).await;

        let (outcome, outputs) = match &result {
            Ok(report) => (TaskOutcome::Success, report.outputs.clone()),
            Err(err) => {
                error!(task = %name, error = %err, "task failed");
                (TaskOutcome::Failed, Vec::new())
            }
        };

        // No subscribers is fine (e.g. `build` without a dev server).
        let _ = self.completions.send(TaskCompletion {
            task: name.to_string(),
            outcome,
            reload: task.reload,
            outputs,
        });

        result
    }

    /// Remove the output root.
    pub async fn clean(&self) -> Result<()> {
        let fs = self.fs.clone();
        let root = self.paths.root.clone();
        let target = self.paths.out_root.clone();
        tokio::task::spawn_blocking(move || clean_dir(fs.as_ref(), &root, &target))
            .await
            .map_err(|e| PipelineError::Other(anyhow::anyhow!("clean worker failed: {e}")))?
    }

    /// Evaluate a composition tree.
    pub fn run<'a>(&'a self, composition: &'a Composition) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match composition {
                Composition::Task(name) => self.run_task(name).await.map(|_| ()),
                Composition::Clean => self.clean().await,
                Composition::Series(children) => {
                    for child in children {
                        self.run(child).await?;
                    }
                    Ok(())
                }
                Composition::Parallel(children) => {
                    let failures: Vec<PipelineError> = join_all(children.iter().map(|c| self.run(c)))
                        .await
                        .into_iter()
                        .filter_map(|r| r.err())
                        .collect();
                    if failures.is_empty() {
                        Ok(())
                    } else {
                        Err(PipelineError::from_failures(failures))
                    }
                }
            }
        })
    }

    /// Run several named tasks concurrently.
    pub async fn run_tasks(&self, names: &[String]) -> Result<()> {
        for name in names {
            self.registry.get(name)?;
        }
        let group = Composition::parallel(names.iter().cloned().map(Composition::Task));
        self.run(&group).await
    }

    /// `clean`, then every build task stage by stage.
    pub async fn build(&self) -> Result<()> {
        let graph = BuildGraph::from_registry(&self.registry)?;
        let composition = graph.composition();
        info!(plan = %composition, "starting build");

        let started = std::time::Instant::now();
        let result = self.run(&composition).await;
        match &result {
            Ok(()) => info!(elapsed_ms = started.elapsed().as_millis() as u64, "build finished"),
            Err(err) => error!(failures = err.failures().len(), "build failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::parse_str;
    use crate::fs::MockFileSystem;

    fn orchestrator(toml: &str, fs: &MockFileSystem) -> Orchestrator {
        let cfg = ConfigFile::try_from(parse_str(toml).unwrap()).unwrap();
        Orchestrator::from_config(&cfg, Arc::new(fs.clone()), "/p")
    }

    const TWO_TASKS: &str = r#"
[task.html-task]
src = "src/*.html"

[task.css-task]
src = "src/sass/style.scss"
dest = "assets/css"
reload = "styles"
steps = [{ kind = "sass", program = "assetpipe-missing-sass" }]
"#;

    #[tokio::test]
    async fn parallel_sibling_completes_when_other_fails() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.html", b"<html></html>");
        fs.add_file("/p/src/sass/style.scss", b"a{");
        let orch = orchestrator(TWO_TASKS, &fs);
        let mut rx = orch.subscribe();

        let err = orch.build().await.unwrap_err();

        assert!(matches!(err, PipelineError::Transformation { .. }));
        assert!(fs.contents(Path::new("/p/dist/index.html")).is_some());

        let mut seen = Vec::new();
        while let Ok(c) = rx.try_recv() {
            seen.push((c.task, c.outcome));
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("css-task".to_string(), TaskOutcome::Failed),
                ("html-task".to_string(), TaskOutcome::Success),
            ]
        );
    }

    #[tokio::test]
    async fn series_stops_at_first_failure() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.html", b"<html></html>");
        fs.add_file("/p/src/sass/style.scss", b"a{");
        let orch = orchestrator(TWO_TASKS, &fs);

        let plan = Composition::series([Composition::task("css-task"), Composition::task("html-task")]);
        assert!(orch.run(&plan).await.is_err());
        assert!(fs.contents(Path::new("/p/dist/index.html")).is_none());
    }

    #[tokio::test]
    async fn run_tasks_rejects_unknown_names_before_running() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.html", b"<html></html>");
        let orch = orchestrator(TWO_TASKS, &fs);

        let err = orch
            .run_tasks(&["html-task".to_string(), "nope".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::TaskNotFound(_)));
        assert!(fs.files_under(Path::new("/p/dist")).is_empty());
    }

    #[tokio::test]
    async fn build_cleans_stale_output_first() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/index.html", b"<html></html>");
        fs.add_file("/p/dist/stale.txt", b"old");
        let orch = orchestrator(
            r#"
[task.html-task]
src = "src/*.html"
"#,
            &fs,
        );

        orch.build().await.unwrap();
        assert!(fs.contents(Path::new("/p/dist/stale.txt")).is_none());
        assert!(fs.contents(Path::new("/p/dist/index.html")).is_some());
    }
}
