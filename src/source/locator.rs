// src/source/locator.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result as AnyResult;
use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::pipeline::Asset;
use crate::source::clean_path;

/// Strip a leading `./` so `./scss/**/*.scss` and `scss/**/*.scss` behave the same.
pub fn normalize_pattern(pattern: &str) -> &str {
    let mut p = pattern.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}

/// Compile a glob the way stream-based build tools read them: `*` stays
/// within one path segment, `**` spans directories.
pub fn compile_glob(pattern: &str) -> std::result::Result<GlobMatcher, globset::Error> {
    let glob = GlobBuilder::new(normalize_pattern(pattern))
        .literal_separator(true)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Longest leading directory of `pattern` that contains no glob syntax.
///
/// Walking starts here instead of at the project root.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let parts: Vec<&str> = normalize_pattern(pattern).split('/').collect();
    // The last segment is a file name (or a pattern for one).
    for part in parts.iter().take(parts.len().saturating_sub(1)) {
        if part.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(part);
    }
    base
}

/// Resolves path groups to concrete files under a project root.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl SourceLocator {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    /// All files matching `pattern`, as root-relative paths, sorted.
    ///
    /// A missing base directory yields an empty set.
    pub fn matching_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = compile_glob(pattern).map_err(|e| {
            PipelineError::ConfigError(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
        let base = glob_base(pattern);
        let start = self.root.join(&base);

        if !self.fs.is_dir(&start) {
            debug!(pattern, ?start, "glob base does not exist; no files");
            return Ok(Vec::new());
        }

        let mut files = self.walk(&start, &matcher)?;
        files.sort();
        debug!(pattern, count = files.len(), "resolved glob");
        Ok(files)
    }

    fn walk(&self, start: &Path, matcher: &GlobMatcher) -> AnyResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![start.to_path_buf()];

        while let Some(dir) = stack.pop() {
            for path in self.fs.read_dir(&dir)? {
                if self.fs.is_dir(&path) {
                    stack.push(path);
                } else if self.fs.is_file(&path) {
                    if let Some(rel) = self.relative(&path) {
                        if matcher.is_match(&rel) {
                            files.push(PathBuf::from(rel));
                        }
                    }
                }
            }
        }

        Ok(files)
    }

    /// Root-relative form of `path` with forward slashes.
    pub fn relative(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.root)
            .ok()
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
    }

    /// Read a root-relative file into an asset.
    ///
    /// The asset's destination path is `rel` relative to `base` (normally the
    /// glob base), falling back to the bare file name.
    pub fn read_asset(&self, rel: &Path, base: &Path) -> Result<Asset> {
        let rel = clean_path(rel);
        let abs = self.root.join(&rel);
        let contents = self
            .fs
            .read_to_string(&abs)
            .map_err(|e| PipelineError::ReadError {
                path: rel.clone(),
                message: format!("{e:#}"),
            })?;

        let relative = match rel.strip_prefix(clean_path(base)) {
            Ok(r) if !r.as_os_str().is_empty() => r.to_path_buf(),
            _ => rel
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| rel.clone()),
        };
        Ok(Asset::new(rel, relative, contents))
    }
}
