// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::tasks::names;
use crate::types::{Compatibility, OutputStyle};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths.scss]
/// src = "scss/**/*.scss"
/// dest = "css"
/// file = "scss/main.scss"
///
/// [paths.css]
/// src = "css/*.css"
/// dest = "css"
/// file = "main.css"
///
/// [minify]
/// compatibility = "ie8"
///
/// [sequence]
/// live = ["live-sass", "clean", "minify-css"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: RawPathsSection,

    #[serde(default)]
    pub sass: SassSection,

    #[serde(default)]
    pub clean: CleanSection,

    #[serde(default)]
    pub minify: MinifySection,

    /// User sequences from `[sequence]`, keyed by sequence name.
    ///
    /// Merged over the built-in `live` sequence.
    #[serde(default)]
    pub sequence: BTreeMap<String, Vec<String>>,

    /// `[[watch]]` rules. If absent, rules are derived from the path groups.
    #[serde(default)]
    pub watch: Option<Vec<WatchRuleConfig>>,
}

/// `[paths]` section: the two path groups, each partially overridable.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawPathsSection {
    #[serde(default)]
    pub scss: RawPathGroup,
    #[serde(default)]
    pub css: RawPathGroup,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawPathGroup {
    pub src: Option<String>,
    pub dest: Option<String>,
    pub file: Option<String>,
}

/// A resolved path group.
///
/// For the preprocessor group `primary_file_name` is the entry file (relative
/// to the project root); for the compiled group it is the output file name
/// written into `destination_directory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGroup {
    pub source_pattern: String,
    pub destination_directory: String,
    pub primary_file_name: String,
}

impl PathGroup {
    pub fn new(src: &str, dest: &str, file: &str) -> Self {
        Self {
            source_pattern: src.to_string(),
            destination_directory: dest.to_string(),
            primary_file_name: file.to_string(),
        }
    }

    pub fn default_scss() -> Self {
        Self::new("scss/**/*.scss", "css", "scss/main.scss")
    }

    pub fn default_css() -> Self {
        Self::new("css/*.css", "css", "main.css")
    }

    /// Fill in any missing field from `defaults`.
    pub fn resolve(raw: &RawPathGroup, defaults: PathGroup) -> Self {
        Self {
            source_pattern: raw.src.clone().unwrap_or(defaults.source_pattern),
            destination_directory: raw.dest.clone().unwrap_or(defaults.destination_directory),
            primary_file_name: raw.file.clone().unwrap_or(defaults.primary_file_name),
        }
    }
}

/// `[sass]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SassSection {
    /// Write a source map next to the compiled file in interactive mode.
    #[serde(default = "default_true")]
    pub source_maps: bool,

    /// Directory, relative to the compiled output directory, for map files.
    #[serde(default = "default_maps_dir")]
    pub maps_dir: String,

    #[serde(default)]
    pub output_style: OutputStyle,

    /// Extra directories searched when resolving imports.
    #[serde(default)]
    pub load_paths: Vec<String>,
}

impl Default for SassSection {
    fn default() -> Self {
        Self {
            source_maps: true,
            maps_dir: default_maps_dir(),
            output_style: OutputStyle::default(),
            load_paths: Vec::new(),
        }
    }
}

/// `[clean]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanSection {
    /// Keep `/*! ... */` comments (licence banners).
    #[serde(default = "default_true")]
    pub preserve_important: bool,
}

impl Default for CleanSection {
    fn default() -> Self {
        Self {
            preserve_important: true,
        }
    }
}

/// `[minify]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MinifySection {
    #[serde(default)]
    pub compatibility: Compatibility,
}

/// One `[[watch]]` rule.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WatchRuleConfig {
    pub pattern: String,
    pub tasks: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_maps_dir() -> String {
    "maps".to_string()
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`, so holders can rely on it being internally consistent.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    scss: PathGroup,
    css: PathGroup,
    sass: SassSection,
    clean: CleanSection,
    minify: MinifySection,
    sequences: BTreeMap<String, Vec<String>>,
    watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scss: PathGroup,
        css: PathGroup,
        sass: SassSection,
        clean: CleanSection,
        minify: MinifySection,
        sequences: BTreeMap<String, Vec<String>>,
        watch: Vec<WatchRuleConfig>,
    ) -> Self {
        Self {
            scss,
            css,
            sass,
            clean,
            minify,
            sequences,
            watch,
        }
    }

    pub fn scss(&self) -> &PathGroup {
        &self.scss
    }

    pub fn css(&self) -> &PathGroup {
        &self.css
    }

    pub fn sass(&self) -> &SassSection {
        &self.sass
    }

    pub fn clean(&self) -> &CleanSection {
        &self.clean
    }

    pub fn minify(&self) -> &MinifySection {
        &self.minify
    }

    /// All sequences, built-in `live` included.
    pub fn sequences(&self) -> &BTreeMap<String, Vec<String>> {
        &self.sequences
    }

    pub fn watch_rules(&self) -> &[WatchRuleConfig] {
        &self.watch
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let scss = PathGroup::default_scss();
        let css = PathGroup::default_css();
        let watch = default_watch_rules(&scss, &css);
        Self::new_unchecked(
            scss,
            css,
            SassSection::default(),
            CleanSection::default(),
            MinifySection::default(),
            default_sequences(),
            watch,
        )
    }
}

/// The built-in `live` release sequence.
pub fn default_sequences() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    map.insert(
        names::LIVE.to_string(),
        vec![
            names::LIVE_SASS.to_string(),
            names::CLEAN.to_string(),
            names::MINIFY_CSS.to_string(),
        ],
    );
    map
}

/// Sources recompile, compiled output gets cleaned.
pub fn default_watch_rules(scss: &PathGroup, css: &PathGroup) -> Vec<WatchRuleConfig> {
    vec![
        WatchRuleConfig {
            pattern: scss.source_pattern.clone(),
            tasks: vec![names::SASS.to_string()],
        },
        WatchRuleConfig {
            pattern: css.source_pattern.clone(),
            tasks: vec![names::CLEAN.to_string()],
        },
    ]
}
