// tests/cli_run.rs

use std::error::Error;

use clap::Parser;

use stylepipe::cli::CliArgs;
use stylepipe::config::ConfigFile;
use stylepipe::errors::PipelineError;
use stylepipe::tasks::build_registry;
use stylepipe::types::Compatibility;
use stylepipe::{run, write_dry_run, write_task_list};
use stylepipe_test_utils::builders::{ConfigFileBuilder, TempProject};
use stylepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const CONFIG: &str = r#"
[minify]
compatibility = "ie9"

[sequence]
ship = ["live", "clean"]
"#;

fn project_with_config() -> TempProject {
    let project = TempProject::new();
    project
        .write("Stylepipe.toml", CONFIG)
        .write("scss/main.scss", "/* note */\nul { li { margin: 0; } }\n");
    project
}

fn args(project: &TempProject, extra: &[&str]) -> Result<CliArgs, Box<dyn Error>> {
    let config = project.path("Stylepipe.toml");
    let config = config.to_str().ok_or("non-utf8 temp path")?.to_string();
    let mut argv = vec!["stylepipe".to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    argv.push("--config".to_string());
    argv.push(config);
    Ok(CliArgs::try_parse_from(argv)?)
}

#[tokio::test]
async fn list_shows_every_runnable_name() -> TestResult {
    init_tracing();

    let project = TempProject::new();
    let cfg = ConfigFileBuilder::new().sequence("ship", &["live", "clean"]).build();
    let registry = build_registry(project.project(cfg))?;

    let mut out = Vec::new();
    write_task_list(&mut out, &registry)?;
    let text = String::from_utf8(out)?;

    let names: Vec<&str> = text
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(
        names,
        vec!["watch", "clean", "live", "live-sass", "minify-css", "sass", "ship"]
    );
    assert!(text.contains("live-sass -> clean -> minify-css"));
    assert!(text.contains("live -> clean"));
    Ok(())
}

#[tokio::test]
async fn dry_run_describes_config_tasks_and_watch_rules() -> TestResult {
    init_tracing();

    let project = TempProject::new();
    let cfg = ConfigFileBuilder::new()
        .compatibility(Compatibility::Ie10)
        .source_maps(false)
        .build();
    let registry = build_registry(project.project(cfg.clone()))?;

    let mut out = Vec::new();
    write_dry_run(&mut out, &cfg, &registry)?;
    let text = String::from_utf8(out)?;

    assert!(text.starts_with("stylepipe dry-run"));
    assert!(text.contains("paths.scss: src = scss/**/*.scss, dest = css, file = scss/main.scss"));
    assert!(text.contains("paths.css: src = css/*.css, dest = css, file = main.css"));
    assert!(text.contains("sass.source_maps = false"));
    assert!(text.contains("minify.compatibility = ie10"));
    assert!(text.contains("tasks (5):"));
    assert!(text.contains("  - live: [\"live-sass\", \"clean\", \"minify-css\"]"));
    assert!(text.contains("watch (2):"));
    assert!(text.contains("  - css/*.css -> [\"clean\"]"));
    Ok(())
}

#[tokio::test]
async fn dry_run_flag_runs_nothing() -> TestResult {
    with_timeout(async {
        init_tracing();

        let project = project_with_config();
        run(args(&project, &["live", "--dry-run"])?).await?;
        run(args(&project, &["live", "--list"])?).await?;

        assert!(!project.exists("css/main.css"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn task_runs_relative_to_the_config_directory() -> TestResult {
    with_timeout(async {
        init_tracing();

        let project = project_with_config();
        run(args(&project, &["ship"])?).await?;

        let css = project.read("css/main.css");
        assert!(!css.contains("/*"));
        assert!(css.contains("ul li{margin:0}"));
        assert!(!project.exists("css/maps"));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn unknown_task_is_reported() -> TestResult {
    init_tracing();

    let project = project_with_config();
    let err = run(args(&project, &["deploy"])?).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::TaskNotFound(name)) if name == "deploy"
    ));
    Ok(())
}

#[test]
fn default_config_has_builtin_tasks_only() -> TestResult {
    let project = TempProject::new();
    let registry = build_registry(project.project(ConfigFile::default()))?;
    let mut out = Vec::new();
    write_task_list(&mut out, &registry)?;
    assert_eq!(String::from_utf8(out)?.lines().count(), 6);
    Ok(())
}
