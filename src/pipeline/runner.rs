// src/pipeline/runner.rs

//! Runs one task's pipeline: resolve → read → steps → write.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::pipeline::Asset;
use crate::pipeline::source::resolve_sources;
use crate::pipeline::steps::{StepContext, apply_step};

/// Summary of one successful task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: String,
    /// Number of source files read.
    pub inputs: usize,
    /// Files written, relative to the output root.
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Where a pipeline reads from and writes to.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    /// Project root; task globs resolve against it.
    pub root: PathBuf,
    /// Output root (`root/[config].dest`).
    pub out_root: PathBuf,
}

impl PipelinePaths {
    pub fn new(root: impl Into<PathBuf>, dest: &str) -> Self {
        let root = root.into();
        let out_root = root.join(dest);
        Self { root, out_root }
    }
}

/// Execute task `name` end to end.
///
/// The task's destination directory is created even when the source glob
/// matches nothing, so later tasks and the dev server can rely on it.
pub async fn run_pipeline(
    fs: Arc<dyn FileSystem>,
    paths: &PipelinePaths,
    name: &str,
    task: &TaskConfig,
) -> Result<TaskReport> {
    let started = Instant::now();

    let assets = {
        let fs = fs.clone();
        let root = paths.root.clone();
        let name = name.to_string();
        let src = task.src.clone();
        let exclude = task.exclude.clone();
        blocking(move || read_sources(fs.as_ref(), &root, &name, &src, &exclude)).await?
    };
    let inputs = assets.len();
    debug!(task = %name, inputs, "sources resolved");

    let ctx = StepContext {
        task: name.to_string(),
        root: paths.root.clone(),
    };
    let mut assets = assets;
    for step in task.steps.iter() {
        assets = apply_step(step, &ctx, assets).await?;
        debug!(task = %name, step = step.name(), files = assets.len(), "step finished");
    }

    let dest_dir = paths.out_root.join(&task.dest);
    let out_root = paths.out_root.clone();
    let outputs = blocking(move || write_outputs(fs.as_ref(), &out_root, &dest_dir, assets)).await?;

    let elapsed = started.elapsed();
    info!(
        task = %name,
        inputs,
        outputs = outputs.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "task finished"
    );

    Ok(TaskReport {
        task: name.to_string(),
        inputs,
        outputs,
        elapsed,
    })
}

fn read_sources(
    fs: &dyn FileSystem,
    root: &Path,
    task: &str,
    src: &str,
    exclude: &[String],
) -> Result<Vec<Asset>> {
    resolve_sources(fs, root, task, src, exclude)?
        .into_iter()
        .map(|file| {
            let contents = fs
                .read(&file.path)
                .map_err(|e| PipelineError::fs(&file.path, e))?;
            Ok(Asset::new(file.path, file.relative, contents))
        })
        .collect()
}

fn write_outputs(
    fs: &dyn FileSystem,
    out_root: &Path,
    dest_dir: &Path,
    assets: Vec<Asset>,
) -> Result<Vec<PathBuf>> {
    fs.create_dir_all(dest_dir)
        .map_err(|e| PipelineError::fs(dest_dir, e))?;

    let mut written = Vec::with_capacity(assets.len());
    for asset in assets {
        let target = dest_dir.join(&asset.relative);
        fs.write(&target, &asset.contents)
            .map_err(|e| PipelineError::fs(&target, e))?;
        written.push(
            target
                .strip_prefix(out_root)
                .map(Path::to_path_buf)
                .unwrap_or(target),
        );
    }
    Ok(written)
}

async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Other(anyhow!("worker thread failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::steps::{SassOptions, StepConfig};
    use crate::fs::MockFileSystem;

    fn task(src: &str, dest: &str) -> TaskConfig {
        TaskConfig {
            src: src.to_string(),
            exclude: Vec::new(),
            dest: dest.to_string(),
            steps: Vec::new(),
            reload: Default::default(),
            include_in_build: true,
            after: Vec::new(),
        }
    }

    fn paths() -> PipelinePaths {
        PipelinePaths::new("/p", "dist")
    }

    #[tokio::test]
    async fn copies_matching_files_preserving_structure() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/assets/img/a.png", b"a");
        fs.add_file("/p/src/assets/img/icons/b.svg", b"b");

        let report = run_pipeline(
            Arc::new(fs.clone()),
            &paths(),
            "copy-assets",
            &task("src/assets/img/**/*.*", "assets/img"),
        )
        .await
        .unwrap();

        assert_eq!(report.inputs, 2);
        assert_eq!(
            fs.contents(Path::new("/p/dist/assets/img/icons/b.svg")).as_deref(),
            Some(&b"b"[..])
        );
        assert!(report.outputs.contains(&PathBuf::from("assets/img/a.png")));
    }

    #[tokio::test]
    async fn empty_match_still_creates_destination() {
        let fs = MockFileSystem::new();
        fs.add_dir("/p/src/assets/fonts");

        let report = run_pipeline(
            Arc::new(fs.clone()),
            &paths(),
            "fonts-task",
            &task("src/assets/fonts/**/*.*", "assets/fonts"),
        )
        .await
        .unwrap();

        assert_eq!(report.inputs, 0);
        assert!(fs.is_dir(Path::new("/p/dist/assets/fonts")));
    }

    #[tokio::test]
    async fn missing_literal_source_is_reported() {
        let fs = MockFileSystem::new();
        let err = run_pipeline(Arc::new(fs), &paths(), "html-task", &task("src/index.html", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn failing_step_writes_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/sass/style.scss", b"a{");

        let mut css = task("src/sass/style.scss", "assets/css");
        css.steps = vec![StepConfig::Sass(SassOptions {
            program: "assetpipe-missing-sass".to_string(),
            ..SassOptions::default()
        })];

        let err = run_pipeline(Arc::new(fs.clone()), &paths(), "css-task", &css)
            .await
            .unwrap_err();
        match err {
            PipelineError::Transformation { task, step, .. } => {
                assert_eq!(task, "css-task");
                assert_eq!(step, "sass");
            }
            other => panic!("expected Transformation, got {other:?}"),
        }
        assert!(fs.files_under(Path::new("/p/dist")).is_empty());
    }
}
