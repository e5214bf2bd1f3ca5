// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in build graph: {0}")]
    DagCycle(String),

    /// A literal (glob-free) source path does not exist.
    #[error("task '{task}': source not found: {}", path.display())]
    SourceNotFound { task: String, path: PathBuf },

    /// An external tool or in-process transformer rejected its input.
    #[error("task '{task}': step '{step}' failed: {message}")]
    Transformation {
        task: String,
        step: &'static str,
        message: String,
    },

    /// Children of a parallel group that failed, in completion order.
    #[error("{} task(s) failed: {}", .0.len(), join_messages(.0))]
    Multiple(Vec<PipelineError>),

    #[error("dev server cannot bind {addr}: address already in use")]
    PortInUse { addr: String },

    #[error("filesystem error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Collapse a group of failures; a single failure is returned as is and
    /// nested groups are flattened.
    pub fn from_failures(failures: Vec<PipelineError>) -> Self {
        let mut flat = Vec::with_capacity(failures.len());
        for err in failures {
            match err {
                PipelineError::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        PipelineError::Multiple(flat)
    }

    /// Every leaf failure in this error.
    pub fn failures(&self) -> Vec<&PipelineError> {
        match self {
            PipelineError::Multiple(inner) => inner.iter().flat_map(|e| e.failures()).collect(),
            other => vec![other],
        }
    }
}

fn join_messages(errors: &[PipelineError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
