// tests/sequencer.rs

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};

use stylepipe::errors::PipelineError;
use stylepipe::tasks::{Sequencer, TaskRegistry};
use stylepipe_test_utils::fake_task::{run_log, runs, FailingTask, RecordingTask, RunLog};
use stylepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn registry_with_failing_b(log: &RunLog) -> Result<TaskRegistry, PipelineError> {
    let mut registry = TaskRegistry::new();
    registry.register("A", RecordingTask::new("A", log))?;
    registry.register("B", FailingTask::new("B", log))?;
    registry.register("C", RecordingTask::new("C", log))?;
    Ok(registry)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn failure_stops_sequence_and_skips_callback() -> TestResult {
    init_tracing();

    let log = run_log();
    let registry = registry_with_failing_b(&log)?;
    let called = AtomicBool::new(false);

    let result = with_timeout(
        Sequencer::new(&registry).run(&names(&["A", "B", "C"]), || {
            called.store(true, Ordering::SeqCst)
        }),
    )
    .await;

    match result {
        Err(PipelineError::TaskFailed { task, source }) => {
            assert_eq!(task, "B");
            assert!(source.to_string().contains("failed on purpose"));
        }
        other => panic!("expected TaskFailed for B, got {other:?}"),
    }
    assert_eq!(runs(&log), vec!["A", "B"]);
    assert!(!called.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn success_runs_in_order_then_calls_back_once() -> TestResult {
    init_tracing();

    let log = run_log();
    let mut registry = TaskRegistry::new();
    for name in ["A", "B", "C"] {
        registry.register(name, RecordingTask::new(name, &log))?;
    }

    let callback_log = log.clone();
    Sequencer::new(&registry)
        .run(&names(&["C", "A", "B"]), move || {
            callback_log.lock().unwrap().push("done".to_string())
        })
        .await?;

    assert_eq!(runs(&log), vec!["C", "A", "B", "done"]);
    Ok(())
}

#[tokio::test]
async fn unknown_name_is_rejected_before_anything_runs() -> TestResult {
    let log = run_log();
    let registry = registry_with_failing_b(&log)?;

    let err = Sequencer::new(&registry)
        .run(&names(&["A", "nope"]), || {})
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TaskNotFound(ref n) if n == "nope"));
    assert!(runs(&log).is_empty());
    Ok(())
}

#[tokio::test]
async fn registered_sequence_reports_the_failing_step() -> TestResult {
    let log = run_log();
    let mut registry = registry_with_failing_b(&log)?;
    registry.register_sequence("release", names(&["A", "B", "C"]))?;
    registry.validate()?;

    let err = registry.run("release").await.unwrap_err();
    assert!(matches!(err, PipelineError::TaskFailed { ref task, .. } if task == "B"));
    assert_eq!(runs(&log), vec!["A", "B"]);
    Ok(())
}
