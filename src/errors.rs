// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A source file could not be read (e.g. the entry file is missing).
    #[error("Read error for {path:?}: {message}")]
    ReadError { path: PathBuf, message: String },

    /// The preprocessor rejected a source file.
    #[error("Compile error in {path:?}: {message}")]
    CompileError { path: PathBuf, message: String },

    #[error("Minify error in {path:?}: {message}")]
    MinifyError { path: PathBuf, message: String },

    #[error("Source map error: {0}")]
    SourceMapError(#[from] serde_json::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in task sequences: {0}")]
    SequenceCycle(String),

    /// A task inside a sequence failed; later tasks were not started.
    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
