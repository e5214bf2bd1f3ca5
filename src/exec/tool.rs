// src/exec/tool.rs

//! External tool invocation (Sass compiler, bundler).
//!
//! Tools are resolved on `PATH` up front so a missing executable produces a
//! clear error instead of a bare spawn failure. Children are killed when the
//! owning future is dropped, which is how a cancelled task stops its tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("`{program}` not found on PATH; install it or set `program` in the step options")]
    NotFound { program: String },

    #[error("`{program}` exited with status {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Builder for one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin: Option<Vec<u8>>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, data: Vec<u8>) -> Self {
        self.stdin = Some(data);
        self
    }

    /// Run the tool to completion, failing on a non-zero exit status.
    pub async fn run(self) -> Result<ToolOutput, ToolError> {
        let resolved = which::which(&self.program).map_err(|_| ToolError::NotFound {
            program: self.program.clone(),
        })?;

        debug!(program = %self.program, args = ?self.args, "running external tool");

        let mut cmd = Command::new(&resolved);
        cmd.args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }

        let io_err = |source| ToolError::Io {
            program: self.program.clone(),
            source,
        };

        let mut child = cmd.spawn().map_err(io_err)?;

        if let Some(data) = self.stdin.clone() {
            if let Some(mut stdin) = child.stdin.take() {
                // Feed stdin concurrently with collecting stdout/stderr.
                let program = self.program.clone();
                tokio::spawn(async move {
                    if let Err(e) = stdin.write_all(&data).await {
                        warn!(program = %program, error = %e, "failed to write tool stdin");
                    }
                });
            }
        }

        let output = child.wait_with_output().await.map_err(io_err)?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        if !stderr.is_empty() {
            debug!(program = %self.program, "stderr: {}", stderr);
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr,
        })
    }
}
