// src/pipeline/sink.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipeline::Asset;

/// What a sink did with an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    Unchanged(PathBuf),
}

/// Final consumer of a pipeline.
pub trait Sink: Send + 'static {
    fn write(&mut self, asset: Asset) -> Result<WriteOutcome>;
}

/// Writes assets to `<root>/<dest>/<asset.relative>`.
///
/// With `skip_unchanged`, a file whose current contents already equal the
/// asset is not rewritten. In-place steps rely on this so their own output
/// does not show up as a fresh change in watch mode.
#[derive(Debug, Clone)]
pub struct DestSink {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    skip_unchanged: bool,
}

impl DestSink {
    /// `dir` is the absolute (root-joined) destination directory.
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
            skip_unchanged: false,
        }
    }

    pub fn skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }
}

impl Sink for DestSink {
    fn write(&mut self, asset: Asset) -> Result<WriteOutcome> {
        let target = self.dir.join(&asset.relative);

        if self.skip_unchanged && self.fs.is_file(&target) {
            if let Ok(current) = self.fs.read_to_string(&target) {
                if current == asset.contents {
                    debug!(?target, "contents unchanged; not rewriting");
                    return Ok(WriteOutcome::Unchanged(target));
                }
            }
        }

        self.fs.write(&target, asset.contents.as_bytes())?;
        info!(file = ?target, bytes = asset.contents.len(), "wrote");
        Ok(WriteOutcome::Written(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn skips_identical_contents_only_when_asked() {
        let fs = MockFileSystem::new();
        fs.add_file("p/css/main.css", "a{}");

        let mut lazy = DestSink::new(Arc::new(fs.clone()), "p/css").skip_unchanged(true);
        let out = lazy.write(Asset::new("css/main.css", "main.css", "a{}")).unwrap();
        assert_eq!(out, WriteOutcome::Unchanged(PathBuf::from("p/css/main.css")));
        assert!(fs.writes().is_empty());

        let mut eager = DestSink::new(Arc::new(fs.clone()), "p/css");
        eager.write(Asset::new("css/main.css", "main.css", "a{}")).unwrap();
        assert_eq!(fs.writes(), vec![PathBuf::from("p/css/main.css")]);
    }
}
