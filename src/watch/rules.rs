// src/watch/rules.rs

use std::fmt;

use globset::GlobMatcher;

use crate::config::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::source::compile_glob;
use crate::tasks::TaskName;

/// A compiled `[[watch]]` rule: paths matching `pattern` trigger `tasks`.
#[derive(Clone)]
pub struct WatchRule {
    pattern: String,
    matcher: GlobMatcher,
    tasks: Vec<TaskName>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("pattern", &self.pattern)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn new(pattern: &str, tasks: Vec<TaskName>) -> Result<Self> {
        let matcher = compile_glob(pattern).map_err(|e| {
            PipelineError::ConfigError(format!("invalid watch pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            tasks,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    /// `rel_path` is relative to the project root with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// Compile the config's watch rules, in declaration order.
pub fn build_rules(cfg: &ConfigFile) -> Result<Vec<WatchRule>> {
    cfg.watch_rules()
        .iter()
        .map(|rule| WatchRule::new(&rule.pattern, rule.tasks.clone()))
        .collect()
}
