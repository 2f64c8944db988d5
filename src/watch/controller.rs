// src/watch/controller.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::tasks::{TaskName, TaskRegistry};
use crate::watch::path_utils::relative_str;
use crate::watch::rules::WatchRule;

/// Events consumed by the controller loop.
///
/// - the filesystem watcher sends `Fs`
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Fs(Event),
    ShutdownRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Dispatching(TaskName),
}

/// Long-running loop that maps filesystem changes to task runs.
///
/// Every qualifying event is handled on its own, in arrival order; there is
/// no debouncing. Tasks mapped from one event run one after another, each at
/// most once per event.
#[derive(Debug)]
pub struct WatchController {
    root: PathBuf,
    rules: Vec<WatchRule>,
    registry: Arc<TaskRegistry>,
    state: WatchState,
}

impl WatchController {
    /// `root` must be the directory event paths are reported under (see
    /// [`WatcherHandle::root`](crate::watch::WatcherHandle::root)).
    pub fn new(root: impl Into<PathBuf>, rules: Vec<WatchRule>, registry: Arc<TaskRegistry>) -> Self {
        Self {
            root: root.into(),
            rules,
            registry,
            state: WatchState::Idle,
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Tasks triggered by a set of root-relative paths, in rule order and
    /// without duplicates.
    pub fn tasks_for_paths<'a>(&self, rel_paths: impl IntoIterator<Item = &'a str>) -> Vec<TaskName> {
        let rel_paths: Vec<&str> = rel_paths.into_iter().collect();
        let mut tasks: Vec<TaskName> = Vec::new();

        for rule in &self.rules {
            if !rel_paths.iter().any(|p| rule.matches(p)) {
                continue;
            }
            for task in rule.tasks() {
                if !tasks.contains(task) {
                    tasks.push(task.clone());
                }
            }
        }

        tasks
    }

    /// Tasks triggered by one notify event. Read-only access is not a change.
    pub fn tasks_for_event(&self, event: &Event) -> Vec<TaskName> {
        if matches!(event.kind, EventKind::Access(_)) {
            return Vec::new();
        }

        let mut rel_paths = Vec::with_capacity(event.paths.len());
        for path in &event.paths {
            match relative_str(&self.root, path) {
                Some(rel) => rel_paths.push(rel),
                None => warn!(
                    "could not relativize path {:?} against root {:?}",
                    path, self.root
                ),
            }
        }

        self.tasks_for_paths(rel_paths.iter().map(String::as_str))
    }

    /// Run every task an event maps to. Returns how many were dispatched.
    pub async fn handle_event(&mut self, event: &Event) -> usize {
        let tasks = self.tasks_for_event(event);
        if tasks.is_empty() {
            debug!(paths = ?event.paths, "no watch rule matched");
            return 0;
        }

        debug!(paths = ?event.paths, ?tasks, "watch match -> dispatching");
        self.dispatch(&tasks).await;
        tasks.len()
    }

    /// Run `tasks` one at a time. Failures are logged; the loop stays alive.
    pub async fn dispatch(&mut self, tasks: &[TaskName]) {
        let registry = Arc::clone(&self.registry);

        for task in tasks {
            self.state = WatchState::Dispatching(task.clone());
            info!(task = %task, "task triggered by file change");

            if let Err(err) = registry.run(task).await {
                error!(task = %task, error = %err, "task failed");
            }

            self.state = WatchState::Idle;
        }
    }

    /// Main event loop. Returns when shutdown is requested or every sender
    /// has gone away.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ControllerEvent>) -> Result<()> {
        info!(root = ?self.root, rules = self.rules.len(), "watching for changes");

        while let Some(event) = events.recv().await {
            match event {
                ControllerEvent::Fs(event) => {
                    self.handle_event(&event).await;
                }
                ControllerEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping watch");
                    break;
                }
            }
        }

        info!("watch loop exiting");
        Ok(())
    }
}
