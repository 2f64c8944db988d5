// src/source/imports.rs

//! Transitive import discovery for SCSS entry files.
//!
//! The preprocessor does the real import expansion; this walk only records
//! which files took part, in first-seen order, so a source map can point back
//! at them. Imports that cannot be resolved are skipped here and left for the
//! compiler to report.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::source::clean_path;

/// A file that contributed to a compiled asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Root-relative path.
    pub path: PathBuf,
    pub contents: String,
}

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@(?:import|use|forward)\s+([^;]+);").expect("valid directive regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("valid quoted-string regex"));

/// Import targets named by the directives in `contents`, in order.
///
/// Plain CSS imports (`url(...)`, remote URLs, `.css` files) and built-in
/// modules such as `sass:math` are left out.
pub fn import_targets(contents: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for directive in DIRECTIVE.captures_iter(contents) {
        let args = &directive[1];
        if args.trim_start().starts_with("url(") {
            continue;
        }
        for quoted in QUOTED.captures_iter(args) {
            let Some(target) = quoted.get(1).or_else(|| quoted.get(2)) else {
                continue;
            };
            let target = target.as_str();
            if is_plain_css_import(target) {
                continue;
            }
            targets.push(target.to_string());
        }
    }
    targets
}

fn is_plain_css_import(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("//")
        || target.starts_with("sass:")
        || target.ends_with(".css")
}

/// Candidate root-relative files for `target` imported from `dir`.
fn candidates(dir: &Path, target: &str) -> Vec<PathBuf> {
    let target_path = Path::new(target);
    let parent = target_path.parent().unwrap_or(Path::new(""));
    let Some(stem) = target_path.file_name().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let base = dir.join(parent);

    let mut out = Vec::new();
    if stem.ends_with(".scss") {
        out.push(base.join(stem));
        out.push(base.join(format!("_{stem}")));
    } else {
        out.push(base.join(format!("{stem}.scss")));
        out.push(base.join(format!("_{stem}.scss")));
        out.push(base.join(stem).join("_index.scss"));
        out.push(base.join(stem).join("index.scss"));
    }
    out.into_iter().map(|p| clean_path(&p)).collect()
}

/// Walk the import graph starting at `entry` (root-relative).
///
/// Returns the entry followed by every reachable partial, depth-first in
/// directive order, each file once. `load_paths` are root-relative
/// directories searched after the importing file's own directory.
pub fn resolve_imports(
    fs: &dyn FileSystem,
    root: &Path,
    entry: &Path,
    load_paths: &[PathBuf],
) -> Result<Vec<SourceFile>> {
    let entry = clean_path(entry);
    let contents = fs
        .read_to_string(&root.join(&entry))
        .map_err(|e| PipelineError::ReadError {
            path: entry.clone(),
            message: format!("{e:#}"),
        })?;

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut out = Vec::new();
    visit(fs, root, entry, contents, load_paths, &mut seen, &mut out);
    Ok(out)
}

fn visit(
    fs: &dyn FileSystem,
    root: &Path,
    path: PathBuf,
    contents: String,
    load_paths: &[PathBuf],
    seen: &mut HashSet<PathBuf>,
    out: &mut Vec<SourceFile>,
) {
    if !seen.insert(path.clone()) {
        return;
    }

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let targets = import_targets(&contents);
    out.push(SourceFile {
        path: path.clone(),
        contents,
    });

    for target in targets {
        let found = std::iter::once(&dir)
            .chain(load_paths.iter())
            .flat_map(|d| candidates(d, &target))
            .find(|c| fs.is_file(&root.join(c)));

        match found {
            Some(child) => {
                if seen.contains(&child) {
                    continue;
                }
                match fs.read_to_string(&root.join(&child)) {
                    Ok(child_contents) => {
                        visit(fs, root, child, child_contents, load_paths, seen, out)
                    }
                    Err(err) => debug!(?child, error = %err, "could not read import"),
                }
            }
            None => debug!(from = ?path, %target, "import not resolved on disk"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn extracts_targets_and_skips_plain_css() {
        let src = r#"
@use "sass:math";
@import 'base', "layout/grid";
@import url("fonts.css");
@import "print.css";
// @import "commented";
@forward "theme";
"#;
        assert_eq!(import_targets(src), vec!["base", "layout/grid", "theme"]);
    }

    #[test]
    fn walks_partials_transitively_once() {
        let fs = MockFileSystem::new();
        fs.add_file("p/scss/main.scss", "@import 'base';\n@import 'components/button';\n");
        fs.add_file("p/scss/_base.scss", "@import 'vars';\nbody { margin: 0; }");
        fs.add_file("p/scss/_vars.scss", "$c: red;");
        fs.add_file(
            "p/scss/components/_button.scss",
            "@import '../vars';\n.btn { color: $c; }",
        );

        let files = resolve_imports(&fs, Path::new("p"), Path::new("scss/main.scss"), &[]).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("scss/main.scss"),
                PathBuf::from("scss/_base.scss"),
                PathBuf::from("scss/_vars.scss"),
                PathBuf::from("scss/components/_button.scss"),
            ]
        );
    }

    #[test]
    fn load_paths_and_index_files_resolve() {
        let fs = MockFileSystem::new();
        fs.add_file("p/scss/main.scss", "@use 'theme';");
        fs.add_file("p/vendor/theme/_index.scss", "a { b: c; }");

        let files = resolve_imports(
            &fs,
            Path::new("p"),
            Path::new("scss/main.scss"),
            &[PathBuf::from("vendor")],
        )
        .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].path, PathBuf::from("vendor/theme/_index.scss"));
    }
}
