// src/pipeline/asset.rs

use std::path::PathBuf;

use crate::source::SourceFile;

/// A file in flight through a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Root-relative path the asset originated from (used in diagnostics).
    pub path: PathBuf,
    /// Path relative to the sink's destination directory.
    pub relative: PathBuf,
    pub contents: String,
    /// Files that contributed to `contents`, when tracked (source maps).
    pub sources: Vec<SourceFile>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            contents: contents.into(),
            sources: Vec::new(),
        }
    }

    /// File name of the destination path, as a string.
    pub fn file_name(&self) -> String {
        self.relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
