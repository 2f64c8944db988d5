// src/tasks/sequencer.rs

use std::time::Instant;

use tracing::{error, info};

use crate::errors::{PipelineError, Result};
use crate::tasks::{TaskName, TaskRegistry};

/// Runs named tasks strictly one after another.
///
/// Each task is awaited to completion before the next starts. The first
/// failure stops the sequence: later tasks are not started, `on_complete` is
/// not called, and the failure comes back as [`PipelineError::TaskFailed`].
#[derive(Debug, Clone, Copy)]
pub struct Sequencer<'r> {
    registry: &'r TaskRegistry,
}

impl<'r> Sequencer<'r> {
    pub fn new(registry: &'r TaskRegistry) -> Self {
        Self { registry }
    }

    pub async fn run<F>(&self, names: &[TaskName], on_complete: F) -> Result<()>
    where
        F: FnOnce() + Send,
    {
        // Refuse to start a sequence that could never finish.
        if let Some(missing) = names.iter().find(|n| !self.registry.contains(n)) {
            return Err(PipelineError::TaskNotFound(missing.clone()));
        }

        for name in names {
            let started = Instant::now();
            info!(task = %name, "starting");

            if let Err(err) = self.registry.run(name).await {
                error!(
                    task = %name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "task failed; stopping sequence"
                );
                return Err(PipelineError::TaskFailed {
                    task: name.clone(),
                    source: Box::new(err),
                });
            }

            info!(
                task = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "finished"
            );
        }

        on_complete();
        Ok(())
    }
}
