// src/orchestrator/compose.rs

//! Series / Parallel composition of tasks.

use std::fmt;

use crate::engine::TaskName;

/// A tree of work evaluated by [`Orchestrator::run`](super::Orchestrator::run).
///
/// - `Series` runs children in order and stops at the first failure.
/// - `Parallel` polls all children concurrently, waits for every one of them,
///   and fails if any child failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    Task(TaskName),
    Clean,
    Series(Vec<Composition>),
    Parallel(Vec<Composition>),
}

impl Composition {
    pub fn task(name: impl Into<TaskName>) -> Self {
        Composition::Task(name.into())
    }

    pub fn series(children: impl IntoIterator<Item = Composition>) -> Self {
        Composition::Series(children.into_iter().collect())
    }

    pub fn parallel(children: impl IntoIterator<Item = Composition>) -> Self {
        Composition::Parallel(children.into_iter().collect())
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, label: &str, children: &[Composition]| {
            write!(f, "{label}(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        };

        match self {
            Composition::Task(name) => f.write_str(name),
            Composition::Clean => f.write_str("clean"),
            Composition::Series(children) => join(f, "series", children),
            Composition::Parallel(children) => join(f, "parallel", children),
        }
    }
}
