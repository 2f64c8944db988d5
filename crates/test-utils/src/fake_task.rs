use std::sync::{Arc, Mutex};

use stylepipe::errors::PipelineError;
use stylepipe::tasks::{Task, TaskFuture};

/// Shared, ordered log of task runs.
pub type RunLog = Arc<Mutex<Vec<String>>>;

pub fn run_log() -> RunLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A task that records its name in a shared log and succeeds.
pub struct RecordingTask {
    name: String,
    log: RunLog,
}

impl RecordingTask {
    pub fn new(name: &str, log: &RunLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
        }
    }
}

impl Task for RecordingTask {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            self.log.lock().unwrap().push(self.name.clone());
            Ok(())
        })
    }

    fn description(&self) -> &str {
        "records that it ran"
    }
}

/// A task that records its name, then fails.
pub struct FailingTask {
    name: String,
    log: RunLog,
}

impl FailingTask {
    pub fn new(name: &str, log: &RunLog) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::clone(log),
        }
    }
}

impl Task for FailingTask {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            self.log.lock().unwrap().push(self.name.clone());
            Err(PipelineError::Other(anyhow::anyhow!(
                "{} failed on purpose",
                self.name
            )))
        })
    }
}

/// Snapshot of the log.
pub fn runs(log: &RunLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
