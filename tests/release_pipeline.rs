// tests/release_pipeline.rs

use std::error::Error;

use stylepipe::config::ConfigFile;
use stylepipe::errors::PipelineError;
use stylepipe::tasks::build_registry;
use stylepipe::types::Compatibility;
use stylepipe_test_utils::builders::{ConfigFileBuilder, TempProject};
use stylepipe_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn live_produces_single_minified_stylesheet() -> TestResult {
    init_tracing();

    let project = TempProject::new();
    project
        .write(
            "scss/main.scss",
            "// entry\n@import 'buttons';\n\n/* page chrome */\n.page {\n  margin: 0 auto;\n  .title { color: #336699; }\n}\n",
        )
        .write(
            "scss/_buttons.scss",
            "/* buttons */\n.btn {\n  padding: 4px 8px;\n  &:hover { color: #ffffff; }\n}\n",
        );

    let registry = build_registry(project.project(ConfigFile::default()))?;
    registry.run("live").await?;

    assert_eq!(project.list("css"), vec!["main.css"]);
    assert!(!project.exists("css/maps"));

    let css = project.read("css/main.css");
    assert!(!css.contains("/*"), "comments left in {css:?}");
    assert!(css.contains(".btn:hover"));
    assert!(css.contains("#369"));
    assert!(Compatibility::Ie8.violations(&css).is_empty());
    Ok(())
}

#[tokio::test]
async fn live_is_idempotent_once_built() -> TestResult {
    let project = TempProject::new();
    project.write("scss/main.scss", "ul { li { list-style: none; } }\n");
    let registry = build_registry(project.project(ConfigFile::default()))?;

    registry.run("live").await?;
    let first = project.read("css/main.css");
    registry.run("live").await?;
    assert_eq!(project.read("css/main.css"), first);
    Ok(())
}

#[tokio::test]
async fn live_stops_after_failed_compile() -> TestResult {
    init_tracing();

    let project = TempProject::new();
    // Stale output from an earlier build must be left alone.
    project.write("css/main.css", "/* stale */ a { color: red; }\n");
    let registry = build_registry(project.project(ConfigFile::default()))?;

    let err = registry.run("live").await.unwrap_err();
    match err {
        PipelineError::TaskFailed { task, source } => {
            assert_eq!(task, "live-sass");
            assert!(matches!(*source, PipelineError::ReadError { .. }));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(project.read("css/main.css"), "/* stale */ a { color: red; }\n");
    Ok(())
}

#[tokio::test]
async fn user_sequence_can_nest_live() -> TestResult {
    let project = TempProject::new();
    project.write("scss/main.scss", "p { margin: 0; }\n");
    let cfg = ConfigFileBuilder::new()
        .sequence("ship", &["live", "clean"])
        .compatibility(Compatibility::Ie10)
        .build();

    build_registry(project.project(cfg))?.run("ship").await?;

    assert_eq!(project.read("css/main.css").trim_end(), "p{margin:0}");
    Ok(())
}
