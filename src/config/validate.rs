// src/config/validate.rs

use std::path::{Component, Path};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::steps::StepConfig;
use crate::errors::{PipelineError, Result};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task, raw.watch))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_watch_rules(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let dest = cfg.config.dest.trim();
    if dest.is_empty() || !is_plain_relative(Path::new(dest)) {
        return Err(config_error(format!(
            "[config].dest must be a relative path inside the project (got {:?})",
            cfg.config.dest
        )));
    }
    if normalize(dest) == normalize(&cfg.config.src) {
        return Err(config_error(
            "[config].dest must differ from [config].src",
        ));
    }
    if cfg.config.host.trim().is_empty() {
        return Err(config_error("[config].host must not be empty"));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if name.trim().is_empty() {
            return Err(config_error("task names must not be empty"));
        }

        let mut globs = vec![task.src.clone()];
        globs.extend(task.exclude.iter().cloned());
        build_globset(&globs).map_err(|e| {
            config_error(format!("task '{name}' has an invalid glob: {e:#}"))
        })?;

        if !task.dest.is_empty() && !is_plain_relative(Path::new(&task.dest)) {
            return Err(config_error(format!(
                "task '{name}': dest must be relative to [config].dest (got {:?})",
                task.dest
            )));
        }

        for step in task.steps.iter() {
            if let StepConfig::Image(opts) = step {
                if !(1..=100).contains(&opts.jpeg_quality) {
                    return Err(config_error(format!(
                        "task '{name}': image.jpeg_quality must be within 1..=100 (got {})",
                        opts.jpeg_quality
                    )));
                }
                if !(opts.svg.dpi.is_finite() && opts.svg.dpi > 0.0) {
                    return Err(config_error(format!(
                        "task '{name}': image.svg.dpi must be positive (got {})",
                        opts.svg.dpi
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (idx, rule) in cfg.watch.iter().enumerate() {
        if rule.patterns.is_empty() {
            return Err(config_error(format!(
                "[[watch]] #{} must list at least one pattern",
                idx + 1
            )));
        }
        if rule.tasks.is_empty() {
            return Err(config_error(format!(
                "[[watch]] #{} must list at least one task",
                idx + 1
            )));
        }
        for task in rule.tasks.iter() {
            if !cfg.task.contains_key(task) {
                return Err(config_error(format!(
                    "[[watch]] #{} refers to unknown task '{}'",
                    idx + 1,
                    task
                )));
            }
        }

        let mut globs = rule.patterns.clone();
        globs.extend(rule.exclude.iter().cloned());
        build_globset(&globs).map_err(|e| {
            config_error(format!("[[watch]] #{} has an invalid glob: {e:#}", idx + 1))
        })?;
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task, so `after = ["A"]` on B adds A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(PipelineError::DagCycle(format!(
                "cycle detected in build graph involving task '{}'",
                node
            )))
        }
    }
}

/// True for paths like `assets/css`: relative, with no `..` or root parts.
fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}

fn normalize(path: &str) -> String {
    path.trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_str;

    fn validate(toml: &str) -> Result<ConfigFile> {
        ConfigFile::try_from(parse_str(toml)?)
    }

    #[test]
    fn builtin_pipeline_is_valid() {
        let cfg = crate::config::loader::builtin_config().unwrap();
        assert_eq!(cfg.tasks().len(), 7);
        assert!(!cfg.task("build-prod-js").unwrap().include_in_build);
    }

    #[test]
    fn dest_must_stay_inside_the_project() {
        for dest in ["", "/tmp/out", "../out", "."] {
            let toml = format!(
                "[config]\ndest = {dest:?}\n[task.a]\nsrc = \"src/*.html\"\n"
            );
            match validate(&toml) {
                Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("dest")),
                other => panic!("dest {dest:?}: expected config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn task_dest_cannot_escape_output_root() {
        let res = validate("[task.a]\nsrc = \"src/*.html\"\ndest = \"../elsewhere\"\n");
        assert!(matches!(res, Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn watch_rule_must_name_known_tasks() {
        let res = validate(
            r#"
[task.a]
src = "src/*.html"

[[watch]]
patterns = ["src/**"]
tasks = ["b"]
"#,
        );
        match res {
            Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("unknown task 'b'")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_glob_is_reported() {
        let res = validate("[task.a]\nsrc = \"src/[*.html\"\n");
        match res {
            Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("invalid glob")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn jpeg_quality_is_range_checked() {
        let res = validate(
            "[task.a]\nsrc = \"src/*.jpg\"\nsteps = [{ kind = \"image\", jpeg_quality = 0 }]\n",
        );
        assert!(matches!(res, Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn svg_dpi_must_be_positive() {
        let res = validate(
            "[task.a]\nsrc = \"src/*.svg\"\nsteps = [{ kind = \"image\", svg = { dpi = 0.0 } }]\n",
        );
        assert!(matches!(res, Err(PipelineError::ConfigError(_))));
    }
}
