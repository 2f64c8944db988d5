// src/tasks/builtin.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipeline::{DestSink, Pipeline, PipelineReport, Source};
use crate::source::{glob_base, normalize_pattern, SourceLocator};
use crate::steps::{CleanStage, CompileStage, ConcatStage, MinifyStage, SourceMapStage};
use crate::tasks::{names, Task, TaskFuture, TaskRegistry};
use crate::types::CompileMode;

/// Everything a built-in task needs: where the project lives, how to touch
/// the filesystem, and the validated config.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub config: ConfigFile,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, config: ConfigFile) -> Self {
        Self {
            root: root.into(),
            fs,
            config,
        }
    }

    pub fn locator(&self) -> SourceLocator {
        SourceLocator::new(self.root.clone(), Arc::clone(&self.fs))
    }
}

/// Compile the entry file into the single configured output file.
#[derive(Debug, Clone)]
pub struct CompileTask {
    project: Arc<Project>,
    mode: CompileMode,
}

impl CompileTask {
    pub fn new(project: Arc<Project>, mode: CompileMode) -> Self {
        Self { project, mode }
    }

    fn label(&self) -> &'static str {
        match self.mode {
            CompileMode::Interactive => names::SASS,
            CompileMode::Release => names::LIVE_SASS,
        }
    }

    /// Run the compile pipeline, propagating any error.
    pub async fn compile(&self) -> Result<PipelineReport> {
        let project = &self.project;
        let cfg = &project.config;
        let scss = cfg.scss();
        let css = cfg.css();
        let sass = cfg.sass();

        let entry = PathBuf::from(normalize_pattern(&scss.primary_file_name));
        let base = entry.parent().map(PathBuf::from).unwrap_or_default();
        let with_maps = self.mode == CompileMode::Interactive && sass.source_maps;

        let compile = CompileStage::new(Arc::clone(&project.fs), project.root.clone())
            .load_paths(sass.load_paths.iter().map(PathBuf::from).collect())
            .style(sass.output_style)
            .track_sources(with_maps);

        let mut pipeline = Pipeline::new(self.label())
            .stage(compile)
            .stage(ConcatStage::new(css.primary_file_name.clone()));
        if with_maps {
            pipeline = pipeline.stage(SourceMapStage::new(
                normalize_pattern(&scss.destination_directory),
                sass.maps_dir.clone(),
            ));
        }

        let sink = DestSink::new(
            Arc::clone(&project.fs),
            project.root.join(normalize_pattern(&scss.destination_directory)),
        );

        pipeline
            .run(
                Source::Files {
                    locator: project.locator(),
                    base,
                    paths: vec![entry],
                },
                sink,
            )
            .await
    }
}

impl Task for CompileTask {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            match (self.compile().await, self.mode) {
                (Ok(report), _) => {
                    info!(task = self.label(), written = report.written.len(), "compiled");
                    Ok(())
                }
                (Err(err), CompileMode::Interactive) => {
                    // Report and carry on; the watcher must survive broken input.
                    error!(task = self.label(), error = %err, "compile failed");
                    eprintln!("[stylepipe] {} failed: {err}", self.label());
                    Ok(())
                }
                (Err(err), CompileMode::Release) => Err(err),
            }
        })
    }

    fn description(&self) -> &str {
        match self.mode {
            CompileMode::Interactive => "compile SCSS with a source map; errors are reported, not fatal",
            CompileMode::Release => "compile SCSS for release; errors abort",
        }
    }
}

/// Which in-place rewrite an [`InPlaceTask`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rewrite {
    StripComments,
    Minify,
}

/// Shared body of the clean and minify tasks: every file matching the
/// compiled-output pattern goes through one stage and is written back where
/// it came from, unless it did not change.
async fn rewrite_in_place(project: &Project, rewrite: Rewrite) -> Result<PipelineReport> {
    let cfg = &project.config;
    let css = cfg.css();
    let locator = project.locator();
    let paths = locator.matching_files(&css.source_pattern)?;
    let base = glob_base(&css.source_pattern);

    let pipeline = match rewrite {
        Rewrite::StripComments => {
            Pipeline::new(names::CLEAN).stage(CleanStage::new(cfg.clean().preserve_important))
        }
        Rewrite::Minify => {
            Pipeline::new(names::MINIFY_CSS).stage(MinifyStage::new(cfg.minify().compatibility))
        }
    };

    let sink = DestSink::new(
        Arc::clone(&project.fs),
        project.root.join(normalize_pattern(&css.destination_directory)),
    )
    .skip_unchanged(true);

    pipeline
        .run(
            Source::Files {
                locator,
                base,
                paths,
            },
            sink,
        )
        .await
}

/// Strip comments from every compiled file, in place.
#[derive(Debug, Clone)]
pub struct CleanTask {
    project: Arc<Project>,
}

impl CleanTask {
    pub fn new(project: Arc<Project>) -> Self {
        Self { project }
    }
}

impl Task for CleanTask {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let report = rewrite_in_place(&self.project, Rewrite::StripComments).await?;
            info!(
                task = names::CLEAN,
                files = report.read,
                rewritten = report.written.len(),
                "cleaned"
            );
            Ok(())
        })
    }

    fn description(&self) -> &str {
        "strip comments from compiled CSS in place"
    }
}

/// Minify every compiled file, in place.
#[derive(Debug, Clone)]
pub struct MinifyTask {
    project: Arc<Project>,
}

impl MinifyTask {
    pub fn new(project: Arc<Project>) -> Self {
        Self { project }
    }
}

impl Task for MinifyTask {
    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let report = rewrite_in_place(&self.project, Rewrite::Minify).await?;
            info!(
                task = names::MINIFY_CSS,
                files = report.read,
                rewritten = report.written.len(),
                profile = %self.project.config.minify().compatibility,
                "minified"
            );
            Ok(())
        })
    }

    fn description(&self) -> &str {
        "minify compiled CSS in place for the compatibility profile"
    }
}

/// Registry with the built-in tasks and every configured sequence.
pub fn build_registry(project: Arc<Project>) -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    registry.register(
        names::SASS,
        CompileTask::new(Arc::clone(&project), CompileMode::Interactive),
    )?;
    registry.register(
        names::LIVE_SASS,
        CompileTask::new(Arc::clone(&project), CompileMode::Release),
    )?;
    registry.register(names::CLEAN, CleanTask::new(Arc::clone(&project)))?;
    registry.register(names::MINIFY_CSS, MinifyTask::new(Arc::clone(&project)))?;

    for (name, steps) in project.config.sequences() {
        registry.register_sequence(name.clone(), steps.clone())?;
    }

    registry.validate()?;
    Ok(registry)
}
