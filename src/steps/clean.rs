// src/steps/clean.rs

use crate::errors::Result;
use crate::pipeline::{Asset, Stage};

/// Remove `/* ... */` comments from a stylesheet.
///
/// - Text inside quoted strings is copied verbatim, escapes included.
/// - With `preserve_important`, comments opening with `/*!` are kept.
/// - An unterminated comment runs to the end of the input.
///
/// Only comment bytes are removed, so the result is stable under a second pass.
pub fn strip_comments(css: &str, preserve_important: bool) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    // Start of the pending run of bytes to copy.
    let mut copy_from = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = css[i + 2..]
                    .find("*/")
                    .map(|rel| i + 2 + rel + 2)
                    .unwrap_or(bytes.len());

                let keep = preserve_important && bytes.get(i + 2) == Some(&b'!');
                if !keep {
                    out.push_str(&css[copy_from..i]);
                    // `/` + `*` meeting across the gap would open a new comment.
                    if out.ends_with('/') && bytes.get(end) == Some(&b'*') {
                        out.push(' ');
                    }
                    copy_from = end;
                }
                i = end;
            }
            _ => i += 1,
        }
    }

    out.push_str(&css[copy_from.min(css.len())..]);
    out
}

/// Stage wrapper around [`strip_comments`].
#[derive(Debug, Clone)]
pub struct CleanStage {
    preserve_important: bool,
}

impl CleanStage {
    pub fn new(preserve_important: bool) -> Self {
        Self { preserve_important }
    }
}

impl Stage for CleanStage {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn transform(&mut self, mut asset: Asset) -> Result<Vec<Asset>> {
        asset.contents = strip_comments(&asset.contents, self.preserve_important);
        Ok(vec![asset])
    }
}
