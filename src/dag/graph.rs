// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::orchestrator::{Composition, TaskRegistry};

/// The `build` graph: every task with `include_in_build`, layered into stages
/// by their `after` dependencies.
///
/// Stage 0 holds tasks with no dependencies; a task lands one stage after the
/// latest of its dependencies. Dependencies on tasks outside the build are
/// ignored here (they only order `build`, they never pull tasks in).
#[derive(Debug, Clone)]
pub struct BuildGraph {
    stages: Vec<Vec<TaskName>>,
}

impl BuildGraph {
    pub fn from_registry(registry: &TaskRegistry) -> Result<Self> {
        let mut graph: DiGraph<TaskName, ()> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for (name, _) in registry.build_tasks() {
            index.insert(name, graph.add_node(name.to_string()));
        }

        for (name, task) in registry.build_tasks() {
            for dep in task.after.iter() {
                match index.get(dep.as_str()) {
                    Some(&from) => {
                        graph.add_edge(from, index[name], ());
                    }
                    None => {
                        debug!(task = %name, dep = %dep, "dependency not part of build; ignoring");
                    }
                }
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| PipelineError::DagCycle(graph[cycle.node_id()].clone()))?;

        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();
        for node in order.iter().copied() {
            let d = graph
                .neighbors_directed(node, Direction::Incoming)
                .filter_map(|dep| depth.get(&dep))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node, d);
        }

        let stage_count = depth.values().max().map(|d| d + 1).unwrap_or(0);
        let mut stages: Vec<Vec<TaskName>> = vec![Vec::new(); stage_count];
        for (node, d) in depth {
            stages[d].push(graph[node].clone());
        }
        for stage in stages.iter_mut() {
            stage.sort();
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Vec<TaskName>] {
        &self.stages
    }

    /// `series(clean, parallel(stage 0), parallel(stage 1), ...)`.
    pub fn composition(&self) -> Composition {
        let mut steps = vec![Composition::Clean];
        steps.extend(
            self.stages
                .iter()
                .map(|stage| Composition::parallel(stage.iter().cloned().map(Composition::Task))),
        );
        Composition::Series(steps)
    }
}
