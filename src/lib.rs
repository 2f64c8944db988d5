// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod source;
pub mod steps;
pub mod tasks;
pub mod types;
pub mod watch;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::errors::PipelineError;
use crate::fs::RealFileSystem;
use crate::tasks::{build_registry, names, Project, TaskEntry, TaskRegistry};
use crate::watch::{build_rules, spawn_watcher, ControllerEvent, WatchController};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry for the project
/// - either a single task / sequence run, or watch mode with Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.as_ref().map(PathBuf::from);
    let cfg = load_or_default(config_path.as_deref())?;
    let root = config_root_dir(config_path.as_deref());

    let project = Arc::new(Project::new(root.clone(), Arc::new(RealFileSystem), cfg));
    let registry = Arc::new(build_registry(Arc::clone(&project))?);

    if args.list {
        write_task_list(&mut io::stdout().lock(), &registry)?;
        return Ok(());
    }

    if args.dry_run {
        write_dry_run(&mut io::stdout().lock(), &project.config, &registry)?;
        return Ok(());
    }

    if args.task == names::WATCH {
        return run_watch(&root, &project.config, registry).await;
    }

    if !registry.contains(&args.task) {
        return Err(PipelineError::TaskNotFound(args.task).into());
    }

    info!(task = %args.task, root = ?root, "running task");
    registry.run(&args.task).await?;
    Ok(())
}

/// Watch the project until Ctrl-C.
async fn run_watch(root: &Path, cfg: &ConfigFile, registry: Arc<TaskRegistry>) -> Result<()> {
    let rules = build_rules(cfg)?;

    let (tx, rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let watcher = spawn_watcher(root, tx.clone())?;

    // Ctrl-C → graceful shutdown.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(ControllerEvent::ShutdownRequested);
    });

    let controller = WatchController::new(watcher.root(), rules, registry);
    controller.run(rx).await?;

    drop(watcher);
    Ok(())
}

/// Figure out the project root.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: Option<&Path>) -> PathBuf {
    config_path
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `--list` output: one line per runnable name.
pub fn write_task_list(out: &mut impl Write, registry: &TaskRegistry) -> io::Result<()> {
    writeln!(out, "{:<12} run on file changes until Ctrl-C", names::WATCH)?;
    for name in registry.names() {
        match registry.entry(name) {
            Some(TaskEntry::Leaf(task)) => writeln!(out, "{name:<12} {}", task.description())?,
            Some(TaskEntry::Sequence(steps)) => writeln!(out, "{name:<12} {}", steps.join(" -> "))?,
            None => {}
        }
    }
    Ok(())
}

/// Simple dry-run output: paths, options, tasks and watch rules.
pub fn write_dry_run(
    out: &mut impl Write,
    cfg: &ConfigFile,
    registry: &TaskRegistry,
) -> io::Result<()> {
    writeln!(out, "stylepipe dry-run")?;
    for (label, group) in [("scss", cfg.scss()), ("css", cfg.css())] {
        writeln!(
            out,
            "  paths.{label}: src = {}, dest = {}, file = {}",
            group.source_pattern, group.destination_directory, group.primary_file_name
        )?;
    }
    let sass = cfg.sass();
    writeln!(
        out,
        "  sass.source_maps = {} (maps_dir = {})",
        sass.source_maps, sass.maps_dir
    )?;
    writeln!(out, "  sass.output_style = {:?}", sass.output_style)?;
    if !sass.load_paths.is_empty() {
        writeln!(out, "  sass.load_paths = {:?}", sass.load_paths)?;
    }
    writeln!(out, "  clean.preserve_important = {}", cfg.clean().preserve_important)?;
    writeln!(out, "  minify.compatibility = {}", cfg.minify().compatibility)?;
    writeln!(out)?;

    let task_names: Vec<&str> = registry.names().collect();
    writeln!(out, "tasks ({}):", task_names.len())?;
    for name in task_names {
        match registry.entry(name) {
            Some(TaskEntry::Sequence(steps)) => writeln!(out, "  - {name}: {steps:?}")?,
            _ => writeln!(out, "  - {name}")?,
        }
    }
    writeln!(out)?;

    writeln!(out, "watch ({}):", cfg.watch_rules().len())?;
    for rule in cfg.watch_rules() {
        writeln!(out, "  - {} -> {:?}", rule.pattern, rule.tasks)?;
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
