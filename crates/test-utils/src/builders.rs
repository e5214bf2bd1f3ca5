#![allow(dead_code)]

use std::collections::BTreeMap;

use assetpipe::config::{ConfigFile, ConfigSection, RawConfigFile, StepConfig, TaskConfig, WatchRuleConfig};
use assetpipe::types::{OverlapBehaviour, ReloadKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_watch(mut self, patterns: &[&str], tasks: &[&str]) -> Self {
        self.config.watch.push(WatchRuleConfig {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
            use_hash: false,
        });
        self
    }

    pub fn with_dest(mut self, dest: &str) -> Self {
        self.config.config.dest = dest.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.config.port = port;
        self
    }

    pub fn with_overlap(mut self, overlap: OverlapBehaviour) -> Self {
        self.config.config.overlap = overlap;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(src: &str) -> Self {
        Self {
            task: TaskConfig {
                src: src.to_string(),
                exclude: Vec::new(),
                dest: String::new(),
                steps: Vec::new(),
                reload: ReloadKind::default(),
                include_in_build: true,
                after: Vec::new(),
            },
        }
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.task.dest = dest.to_string();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.task.exclude.push(pattern.to_string());
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.task.steps.push(step);
        self
    }

    pub fn reload(mut self, reload: ReloadKind) -> Self {
        self.task.reload = reload;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn include_in_build(mut self, val: bool) -> Self {
        self.task.include_in_build = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
