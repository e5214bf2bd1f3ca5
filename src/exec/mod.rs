// src/exec/mod.rs

//! Execution layer.
//!
//! - [`tool`] runs external tools (Sass compiler, bundler) as child processes.
//! - [`executor_loop`] owns the loop that starts and cancels task invocations
//!   for watch mode.
//! - [`task_runner`] drives one invocation through the orchestrator.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `PipelineExecutor` that the runtime uses in production, and which tests
//!   can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;
pub mod tool;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use executor_loop::spawn_executor;
pub use tool::{ToolCommand, ToolError, ToolOutput};
