// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::model::{ConfigFile, WatchRuleConfig};
use crate::engine::TaskName;

/// Compiled watch rule: glob patterns (relative to the project root) mapped to
/// the tasks they re-run.
#[derive(Clone)]
pub struct WatchRule {
    patterns: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    tasks: Vec<TaskName>,
    use_hash: bool,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("patterns", &self.patterns)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn compile(cfg: &WatchRuleConfig) -> Result<Self> {
        let watch_set = build_globset(&cfg.patterns)
            .with_context(|| format!("building watch globset for {:?}", cfg.patterns))?;

        let exclude_set = if cfg.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&cfg.exclude)
                    .with_context(|| format!("building exclude globset for {:?}", cfg.exclude))?,
            )
        };

        Ok(Self {
            patterns: cfg.patterns.clone(),
            watch_set,
            exclude_set,
            tasks: cfg.tasks.clone(),
            use_hash: cfg.use_hash,
        })
    }

    /// Tasks re-run when this rule matches.
    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Returns true if `rel_path` (relative to the project root, forward
    /// slashes, e.g. `"src/js/app.js"`) is covered by this rule.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compile every effective watch rule of a validated config.
pub fn build_rules_from_config(cfg: &ConfigFile) -> Result<Vec<WatchRule>> {
    cfg.effective_watch_rules()
        .iter()
        .map(WatchRule::compile)
        .collect()
}

/// Build a GlobSet from simple string patterns.
///
/// A leading `./` is ignored and `*` does not cross directory separators, so
/// `src/assets/*.*` matches `src/assets/logo.png` but not
/// `src/assets/img/logo.png`.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(strip_dot_slash(pat))
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

pub fn strip_dot_slash(pattern: &str) -> &str {
    let mut p = pattern;
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(patterns: &[&str], exclude: &[&str]) -> WatchRule {
        WatchRule::compile(&WatchRuleConfig {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            tasks: vec!["t".to_string()],
            use_hash: false,
        })
        .unwrap()
    }

    #[test]
    fn single_star_stays_in_one_directory() {
        let r = rule(&["./src/assets/*.*"], &[]);
        assert!(r.matches("src/assets/favicon.ico"));
        assert!(!r.matches("src/assets/img/logo.png"));
    }

    #[test]
    fn double_star_recurses() {
        let r = rule(&["src/assets/sass/**/*.scss"], &[]);
        assert!(r.matches("src/assets/sass/style.scss"));
        assert!(r.matches("src/assets/sass/blocks/_header.scss"));
        assert!(!r.matches("src/assets/sass/readme.md"));
    }

    #[test]
    fn exclude_wins_over_watch() {
        let r = rule(&["src/js/**/*.js"], &["src/js/vendor/**"]);
        assert!(r.matches("src/js/main.js"));
        assert!(!r.matches("src/js/vendor/lib.js"));
    }
}
