// src/tasks/mod.rs

//! Named tasks and how they are run.
//!
//! - [`registry`]: an explicit `TaskRegistry` holding leaf tasks and
//!   sequences, passed to whichever entry point needs it.
//! - [`sequencer`]: runs an ordered list of task names, stopping at the first
//!   failure.
//! - [`builtin`]: the compile / clean / minify tasks for a project.

pub mod builtin;
pub mod registry;
pub mod sequencer;

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub use builtin::{build_registry, CleanTask, CompileTask, MinifyTask, Project};
pub use registry::{TaskEntry, TaskRegistry};
pub use sequencer::Sequencer;

/// Canonical task name type.
pub type TaskName = String;

/// Boxed future returned by [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A named, zero-argument, side-effecting operation.
///
/// Completion of the returned future means all of the task's file I/O has
/// drained; an `Err` is a failed task.
pub trait Task: Send + Sync {
    fn run(&self) -> TaskFuture<'_>;

    /// One-line summary shown by `--list`.
    fn description(&self) -> &str {
        ""
    }
}

/// Names of the tasks every project has.
pub mod names {
    pub const WATCH: &str = "watch";
    pub const SASS: &str = "sass";
    pub const CLEAN: &str = "clean";
    pub const LIVE_SASS: &str = "live-sass";
    pub const MINIFY_CSS: &str = "minify-css";
    pub const LIVE: &str = "live";

    /// Leaf tasks registered for every project (`watch` is an entry point,
    /// not a task).
    pub const BUILTIN_TASKS: [&str; 4] = [SASS, CLEAN, LIVE_SASS, MINIFY_CSS];

    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_TASKS.contains(&name)
    }
}
