// src/steps/mod.rs

//! Pipeline stages that make up the build steps.
//!
//! - [`compile`]: SCSS → CSS through `grass`.
//! - [`concat`]: join every asset into one named file.
//! - [`sourcemap`]: emit a v3 source map next to a compiled file.
//! - [`clean`]: strip comments.
//! - [`minify`]: shrink with `lightningcss` under a compatibility profile.

pub mod clean;
pub mod compile;
pub mod concat;
pub mod minify;
pub mod sourcemap;

pub use clean::{strip_comments, CleanStage};
pub use compile::CompileStage;
pub use concat::ConcatStage;
pub use minify::{minify_css, MinifyStage};
pub use sourcemap::{build_source_map, SourceMap, SourceMapStage};
