// src/source/mod.rs

//! Locating input files.
//!
//! - [`locator`] turns glob patterns into on-disk file sets and reads entry
//!   files into pipeline assets.
//! - [`imports`] follows `@import` / `@use` / `@forward` directives so the
//!   compile step knows every file that contributed to its output.

pub mod imports;
pub mod locator;

use std::path::{Component, Path, PathBuf};

pub use imports::{resolve_imports, SourceFile};
pub use locator::{compile_glob, glob_base, normalize_pattern, SourceLocator};

/// Lexically normalise a relative path: drop `.` components and fold `..`
/// into the preceding component where possible.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Path of `to` as seen from directory `from_dir`, both relative to the same
/// root, using forward slashes.
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
    let from = clean_path(from_dir);
    let to = clean_path(to);
    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for comp in &to[common..] {
        parts.push(comp.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_folds_parent_dirs() {
        assert_eq!(
            clean_path(Path::new("./scss/base/../_vars.scss")),
            PathBuf::from("scss/_vars.scss")
        );
        assert_eq!(clean_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn relative_path_walks_up_from_map_dir() {
        assert_eq!(
            relative_path(Path::new("css/maps"), Path::new("scss/main.scss")),
            "../../scss/main.scss"
        );
        assert_eq!(
            relative_path(Path::new("css"), Path::new("css/main.css")),
            "main.css"
        );
    }
}
