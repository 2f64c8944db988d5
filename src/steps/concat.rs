// src/steps/concat.rs

use std::collections::HashSet;
use std::path::PathBuf;

use crate::errors::Result;
use crate::pipeline::{Asset, Stage};

/// Buffers every asset and emits a single file named `file_name` on flush.
///
/// Contents are joined with a newline; tracked sources are merged keeping the
/// first occurrence of each path. Nothing is emitted if nothing came in.
#[derive(Debug)]
pub struct ConcatStage {
    file_name: String,
    pending: Vec<Asset>,
}

impl ConcatStage {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            pending: Vec::new(),
        }
    }
}

impl Stage for ConcatStage {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn transform(&mut self, asset: Asset) -> Result<Vec<Asset>> {
        self.pending.push(asset);
        Ok(Vec::new())
    }

    fn flush(&mut self) -> Result<Vec<Asset>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let pending = std::mem::take(&mut self.pending);
        let path = pending[0].path.clone();
        let contents = pending
            .iter()
            .map(|a| a.contents.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut seen = HashSet::new();
        let sources = pending
            .into_iter()
            .flat_map(|a| a.sources)
            .filter(|s| seen.insert(s.path.clone()))
            .collect();

        let mut out = Asset::new(path, PathBuf::from(&self.file_name), contents);
        out.sources = sources;
        Ok(vec![out])
    }
}
