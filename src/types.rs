// src/types.rs

//! Small shared value types used by config, steps and the CLI.

use std::fmt;
use std::str::FromStr;

use lightningcss::targets::{Browsers, Targets};
use serde::Deserialize;

/// Output formatting used by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

impl From<OutputStyle> for grass::OutputStyle {
    fn from(style: OutputStyle) -> Self {
        match style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        }
    }
}

/// Whether a compile runs interactively (watch) or as part of a release.
///
/// - `Interactive`: source maps when enabled, errors are reported and swallowed.
/// - `Release`: no source maps, errors propagate to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    Interactive,
    Release,
}

/// Named legacy-browser compatibility level for the minifier.
///
/// Mirrors the levels accepted by clean-css style tools: `ie7` through
/// `ie11`, plus `*` meaning "IE10 and newer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Compatibility {
    Ie7,
    #[default]
    Ie8,
    Ie9,
    Ie10,
    Ie11,
}

impl Compatibility {
    /// Internet Explorer major version this profile targets.
    pub fn ie_version(self) -> u32 {
        match self {
            Compatibility::Ie7 => 7,
            Compatibility::Ie8 => 8,
            Compatibility::Ie9 => 9,
            Compatibility::Ie10 => 10,
            Compatibility::Ie11 => 11,
        }
    }

    /// Browser targets handed to lightningcss.
    pub fn targets(self) -> Targets {
        let browsers = Browsers {
            ie: Some(self.ie_version() << 16),
            ..Browsers::default()
        };
        Targets::from(browsers)
    }

    /// Constructs in `css` that fall outside this profile's supported syntax.
    ///
    /// This is a lexical scan over minified output, not a full parse; each
    /// entry names the offending construct once.
    pub fn violations(self, css: &str) -> Vec<String> {
        let lower = without_literals(&css.to_ascii_lowercase());
        let ie = self.ie_version();
        let mut found = Vec::new();

        let mut check = |max_unsupported: u32, needle: &str, label: &str| {
            if ie <= max_unsupported && lower.contains(needle) {
                found.push(label.to_string());
            }
        };

        // Custom properties are unsupported in every IE version.
        check(11, "var(--", "custom property reference `var()`");
        check(11, "@supports", "`@supports` rule");
        check(8, "calc(", "`calc()` expression");
        check(8, "rgba(", "`rgba()` color");
        check(8, "hsla(", "`hsla()` color");
        check(8, "::", "double-colon pseudo-element");
        check(8, "@font-feature-values", "`@font-feature-values` rule");
        check(9, "linear-gradient(", "`linear-gradient()` image");
        check(9, "radial-gradient(", "`radial-gradient()` image");

        if lower.split(['{', ';']).any(|chunk| chunk.trim_start().starts_with("--")) {
            found.push("custom property declaration".to_string());
        }

        found
    }
}

/// `css` with the insides of quoted strings and `url(...)` emptied, so
/// their text is never mistaken for syntax.
fn without_literals(css: &str) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    let mut copy_from = 0;

    while i < bytes.len() {
        let end = match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != quote {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                Some(j.min(bytes.len()))
            }
            b'u' if css[i..].starts_with("url(") => {
                Some(css[i..].find(')').map_or(bytes.len(), |rel| i + rel))
            }
            _ => None,
        };

        match end {
            Some(end) => {
                // Keep the opener so `url(` / quotes stay recognisable.
                let open = if bytes[i] == b'u' { i + 4 } else { i + 1 };
                out.push_str(&css[copy_from..open]);
                copy_from = end;
                i = end + 1;
            }
            None => i += 1,
        }
    }

    out.push_str(&css[copy_from.min(css.len())..]);
    out
}

impl FromStr for Compatibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ie7" => Ok(Compatibility::Ie7),
            "ie8" => Ok(Compatibility::Ie8),
            "ie9" => Ok(Compatibility::Ie9),
            "ie10" | "*" => Ok(Compatibility::Ie10),
            "ie11" => Ok(Compatibility::Ie11),
            other => Err(format!(
                "invalid compatibility profile: {other} (expected ie7, ie8, ie9, ie10, ie11 or *)"
            )),
        }
    }
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ie{}", self.ie_version())
    }
}

impl<'de> Deserialize<'de> for Compatibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
