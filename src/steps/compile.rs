// src/steps/compile.rs

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::pipeline::{Asset, Stage};
use crate::source::resolve_imports;
use crate::types::OutputStyle;

/// Lets grass resolve imports through the same [`FileSystem`] the pipeline
/// reads from.
#[derive(Debug)]
struct SassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0
            .read_to_string(path)
            .map(String::into_bytes)
            .map_err(|e| io::Error::other(format!("{e:#}")))
    }
}

/// Translates an SCSS asset into CSS.
///
/// Imports are resolved relative to the asset's own directory first, then
/// the configured load paths (all root-relative).
#[derive(Debug)]
pub struct CompileStage {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    load_paths: Vec<PathBuf>,
    style: OutputStyle,
    track_sources: bool,
}

impl CompileStage {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
            load_paths: Vec::new(),
            style: OutputStyle::default(),
            track_sources: false,
        }
    }

    pub fn load_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.load_paths = paths;
        self
    }

    pub fn style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    /// Record contributing files on the output asset (needed for source maps).
    pub fn track_sources(mut self, track: bool) -> Self {
        self.track_sources = track;
        self
    }
}

impl Stage for CompileStage {
    fn name(&self) -> &'static str {
        "compile"
    }

    fn transform(&mut self, asset: Asset) -> Result<Vec<Asset>> {
        let entry_dir = self
            .root
            .join(asset.path.parent().unwrap_or_else(|| Path::new("")));

        let sass_fs = SassFs(self.fs.as_ref());
        let mut options = grass::Options::default()
            .fs(&sass_fs)
            .style(self.style.into())
            .load_path(&entry_dir);
        for lp in &self.load_paths {
            options = options.load_path(self.root.join(lp));
        }

        let css = grass::from_string(asset.contents.clone(), &options).map_err(|e| {
            PipelineError::CompileError {
                path: asset.path.clone(),
                message: e.to_string(),
            }
        })?;

        let mut out = Asset::new(
            asset.path.clone(),
            asset.relative.with_extension("css"),
            css,
        );

        if self.track_sources {
            out.sources =
                resolve_imports(self.fs.as_ref(), &self.root, &asset.path, &self.load_paths)?;
        }

        debug!(
            path = ?asset.path,
            bytes = out.contents.len(),
            sources = out.sources.len(),
            "compiled"
        );
        Ok(vec![out])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn mock_project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("site/scss/main.scss", "@import 'nav';\n.page { color: red; }\n");
        fs.add_file("site/scss/_nav.scss", "@import 'parts/links';\nnav { margin: 0; }\n");
        fs.add_file("site/scss/parts/_links.scss", "a { color: blue; }\n");
        fs.add_file("site/vendor/_tokens.scss", "$gap: 4px;\n");
        fs
    }

    fn entry(fs: &MockFileSystem) -> Asset {
        let contents = fs.contents("site/scss/main.scss").unwrap();
        Asset::new("scss/main.scss", "main.scss", contents)
    }

    #[test]
    fn imports_resolve_through_the_pipeline_filesystem() {
        let fs = mock_project();
        let mut stage = CompileStage::new(Arc::new(fs.clone()), "site").track_sources(true);

        let out = stage.transform(entry(&fs)).unwrap();
        assert_eq!(out.len(), 1);
        let css = &out[0];
        assert_eq!(css.relative, PathBuf::from("main.css"));
        assert!(css.contents.contains("a {"));
        assert!(css.contents.contains("nav {"));
        assert!(css.contents.contains(".page {"));

        let sources: Vec<_> = css.sources.iter().map(|s| s.path.clone()).collect();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("scss/main.scss"),
                PathBuf::from("scss/_nav.scss"),
                PathBuf::from("scss/parts/_links.scss"),
            ]
        );
    }

    #[test]
    fn load_paths_are_searched_on_the_same_filesystem() {
        let fs = mock_project();
        let mut stage = CompileStage::new(Arc::new(fs.clone()), "site")
            .load_paths(vec![PathBuf::from("vendor")]);

        let asset = Asset::new("scss/main.scss", "main.scss", "@import 'tokens';\np { margin: $gap; }\n");
        let out = stage.transform(asset).unwrap();
        assert!(out[0].contents.contains("margin: 4px"));
    }

    #[test]
    fn missing_partial_is_a_compile_error() {
        let fs = MockFileSystem::new();
        let mut stage = CompileStage::new(Arc::new(fs), "site");

        let err = stage
            .transform(Asset::new("scss/main.scss", "main.scss", "@import 'gone';\n"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::CompileError { .. }));
    }
}
