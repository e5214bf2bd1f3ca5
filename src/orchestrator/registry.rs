// src/orchestrator/registry.rs

use std::collections::BTreeMap;

use crate::config::{ConfigFile, TaskConfig};
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};

/// Every task declared at startup, keyed by name.
///
/// Built once from a validated [`ConfigFile`] and shared by `Arc` with
/// whatever needs to invoke tasks. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskConfig>,
}

impl TaskRegistry {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            tasks: cfg.tasks().clone(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&TaskConfig> {
        self.tasks
            .get(name)
            .ok_or_else(|| PipelineError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All task names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskConfig)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Tasks that `build` runs.
    pub fn build_tasks(&self) -> impl Iterator<Item = (&str, &TaskConfig)> {
        self.iter().filter(|(_, t)| t.include_in_build)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_config;

    #[test]
    fn unknown_task_is_reported() {
        let registry = TaskRegistry::from_config(&builtin_config().unwrap());
        match registry.get("sprite-task") {
            Err(PipelineError::TaskNotFound(name)) => assert_eq!(name, "sprite-task"),
            other => panic!("expected TaskNotFound, got {other:?}"),
        }
    }

    #[test]
    fn production_bundle_is_not_part_of_build() {
        let registry = TaskRegistry::from_config(&builtin_config().unwrap());
        let build: Vec<_> = registry.build_tasks().map(|(n, _)| n).collect();
        assert!(registry.contains("build-prod-js"));
        assert!(!build.contains(&"build-prod-js"));
        assert_eq!(build.len(), 6);
    }
}
