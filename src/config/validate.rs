// src/config/validate.rs

use crate::config::model::{
    default_watch_rules, default_sequences, ConfigFile, PathGroup, RawConfigFile,
};
use crate::errors::{PipelineError, Result};
use crate::source::compile_glob;
use crate::tasks::names;
use crate::tasks::registry::check_sequences;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let scss = PathGroup::resolve(&raw.paths.scss, PathGroup::default_scss());
        let css = PathGroup::resolve(&raw.paths.css, PathGroup::default_css());

        validate_path_group("scss", &scss)?;
        validate_path_group("css", &css)?;
        validate_sass(&raw)?;

        let mut sequences = default_sequences();
        for (name, steps) in raw.sequence {
            sequences.insert(name, steps);
        }
        validate_sequences(&sequences)?;

        let watch = raw
            .watch
            .unwrap_or_else(|| default_watch_rules(&scss, &css));
        validate_watch_rules(&watch, &sequences)?;

        Ok(ConfigFile::new_unchecked(
            scss,
            css,
            raw.sass,
            raw.clean,
            raw.minify,
            sequences,
            watch,
        ))
    }
}

fn validate_path_group(label: &str, group: &PathGroup) -> Result<()> {
    if group.source_pattern.trim().is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "[paths.{label}].src must not be empty"
        )));
    }
    compile_glob(&group.source_pattern).map_err(|e| {
        PipelineError::ConfigError(format!("[paths.{label}].src is not a valid glob: {e}"))
    })?;

    if group.destination_directory.trim().is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "[paths.{label}].dest must not be empty"
        )));
    }
    if group.primary_file_name.trim().is_empty() {
        return Err(PipelineError::ConfigError(format!(
            "[paths.{label}].file must not be empty"
        )));
    }
    Ok(())
}

fn validate_sass(raw: &RawConfigFile) -> Result<()> {
    let maps_dir = raw.sass.maps_dir.trim();
    if maps_dir.is_empty() {
        return Err(PipelineError::ConfigError(
            "[sass].maps_dir must not be empty".to_string(),
        ));
    }
    if maps_dir.split(['/', '\\']).any(|part| part == "..") {
        return Err(PipelineError::ConfigError(format!(
            "[sass].maps_dir must stay inside the output directory (got {maps_dir})"
        )));
    }
    Ok(())
}

fn validate_sequences(sequences: &std::collections::BTreeMap<String, Vec<String>>) -> Result<()> {
    for (name, steps) in sequences {
        if names::is_builtin(name) || name == names::WATCH {
            return Err(PipelineError::ConfigError(format!(
                "sequence '{name}' shadows a built-in task"
            )));
        }
        if steps.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "sequence '{name}' must list at least one task"
            )));
        }
    }

    check_sequences(names::BUILTIN_TASKS.iter().copied(), sequences).map_err(|e| match e {
        PipelineError::TaskNotFound(msg) => PipelineError::ConfigError(msg),
        other => other,
    })
}

fn validate_watch_rules(
    rules: &[crate::config::model::WatchRuleConfig],
    sequences: &std::collections::BTreeMap<String, Vec<String>>,
) -> Result<()> {
    for rule in rules {
        compile_glob(&rule.pattern).map_err(|e| {
            PipelineError::ConfigError(format!("watch pattern '{}' is invalid: {e}", rule.pattern))
        })?;
        if rule.tasks.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "watch rule '{}' must list at least one task",
                rule.pattern
            )));
        }
        for task in &rule.tasks {
            if task == names::WATCH {
                return Err(PipelineError::ConfigError(format!(
                    "watch rule '{}' cannot trigger the watch task itself",
                    rule.pattern
                )));
            }
            if !names::is_builtin(task) && !sequences.contains_key(task) {
                return Err(PipelineError::ConfigError(format!(
                    "watch rule '{}' references unknown task '{}'",
                    rule.pattern, task
                )));
            }
        }
    }
    Ok(())
}
