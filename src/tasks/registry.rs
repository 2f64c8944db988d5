// src/tasks/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{PipelineError, Result};
use crate::tasks::{Sequencer, Task, TaskFuture, TaskName};

/// What a registered name refers to.
#[derive(Clone)]
pub enum TaskEntry {
    Leaf(Arc<dyn Task>),
    /// Run these tasks in order through the [`Sequencer`].
    Sequence(Vec<TaskName>),
}

impl fmt::Debug for TaskEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskEntry::Leaf(task) => f
                .debug_tuple("Leaf")
                .field(&task.description())
                .finish(),
            TaskEntry::Sequence(steps) => f.debug_tuple("Sequence").field(steps).finish(),
        }
    }
}

/// The set of runnable tasks, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    entries: BTreeMap<TaskName, TaskEntry>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<TaskName>, task: impl Task + 'static) -> Result<()> {
        self.insert(name.into(), TaskEntry::Leaf(Arc::new(task)))
    }

    pub fn register_sequence(
        &mut self,
        name: impl Into<TaskName>,
        steps: Vec<TaskName>,
    ) -> Result<()> {
        self.insert(name.into(), TaskEntry::Sequence(steps))
    }

    fn insert(&mut self, name: TaskName, entry: TaskEntry) -> Result<()> {
        if self.entries.contains_key(&name) {
            return Err(PipelineError::DuplicateTask(name));
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn entry(&self, name: &str) -> Option<&TaskEntry> {
        self.entries.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Check that every sequence refers to registered names and that
    /// sequences do not (transitively) contain themselves.
    pub fn validate(&self) -> Result<()> {
        let mut leaves = Vec::new();
        let mut sequences = BTreeMap::new();
        for (name, entry) in &self.entries {
            match entry {
                TaskEntry::Leaf(_) => leaves.push(name.as_str()),
                TaskEntry::Sequence(steps) => {
                    sequences.insert(name.clone(), steps.clone());
                }
            }
        }
        check_sequences(leaves, &sequences)
    }

    /// Run a task (or sequence) by name.
    pub fn run<'a>(&'a self, name: &'a str) -> TaskFuture<'a> {
        Box::pin(async move {
            match self.entries.get(name) {
                None => Err(PipelineError::TaskNotFound(name.to_string())),
                Some(TaskEntry::Leaf(task)) => task.run().await,
                Some(TaskEntry::Sequence(steps)) => Sequencer::new(self).run(steps, || {}).await,
            }
        })
    }
}

/// Validate sequence definitions against a set of leaf task names.
///
/// - every step must name a leaf or another sequence (`TaskNotFound`);
/// - the "contains" relation between sequences must be acyclic
///   (`SequenceCycle`).
pub fn check_sequences<'a>(
    leaves: impl IntoIterator<Item = &'a str>,
    sequences: &BTreeMap<String, Vec<String>>,
) -> Result<()> {
    let leaves: Vec<&str> = leaves.into_iter().collect();

    for (name, steps) in sequences {
        for step in steps {
            if !leaves.contains(&step.as_str()) && !sequences.contains_key(step) {
                return Err(PipelineError::TaskNotFound(format!(
                    "sequence '{name}' references unknown task '{step}'"
                )));
            }
        }
    }

    // Edge direction: sequence -> step.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in sequences.keys() {
        graph.add_node(name.as_str());
    }
    for (name, steps) in sequences {
        for step in steps {
            if sequences.contains_key(step) {
                graph.add_edge(name.as_str(), step.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PipelineError::SequenceCycle(format!(
            "sequence '{}' ends up running itself",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Task for Noop {
        fn run(&self) -> TaskFuture<'_> {
            Box::pin(async { Ok(()) })
        }
    }

    fn seqs(defs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        defs.iter()
            .map(|(n, steps)| (n.to_string(), steps.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = TaskRegistry::new();
        reg.register("a", Noop).unwrap();
        assert!(matches!(
            reg.register_sequence("a", vec![]),
            Err(PipelineError::DuplicateTask(name)) if name == "a"
        ));
    }

    #[test]
    fn nested_sequences_are_fine() {
        let s = seqs(&[("build", &["a", "b"]), ("release", &["build", "c"])]);
        check_sequences(["a", "b", "c"], &s).unwrap();
    }

    #[test]
    fn unknown_step_is_reported() {
        let s = seqs(&[("release", &["a", "nope"])]);
        match check_sequences(["a"], &s) {
            Err(PipelineError::TaskNotFound(msg)) => assert!(msg.contains("nope")),
            other => panic!("expected TaskNotFound, got {other:?}"),
        }
    }

    #[test]
    fn cycles_are_reported() {
        let s = seqs(&[("x", &["y"]), ("y", &["a", "x"])]);
        assert!(matches!(
            check_sequences(["a"], &s),
            Err(PipelineError::SequenceCycle(_))
        ));

        let self_loop = seqs(&[("x", &["x"])]);
        assert!(matches!(
            check_sequences(["a"], &self_loop),
            Err(PipelineError::SequenceCycle(_))
        ));
    }

    #[tokio::test]
    async fn unknown_task_fails_to_run() {
        let reg = TaskRegistry::new();
        assert!(matches!(
            reg.run("ghost").await,
            Err(PipelineError::TaskNotFound(_))
        ));
    }
}
