// src/steps/minify.rs

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use tracing::warn;

use crate::errors::{PipelineError, Result};
use crate::pipeline::{Asset, Stage};
use crate::types::Compatibility;

/// Minify `css` for the browsers named by `compat`.
///
/// `filename` only shows up in error messages.
pub fn minify_css(css: &str, filename: &str, compat: Compatibility) -> Result<String> {
    let to_err = |message: String| PipelineError::MinifyError {
        path: filename.into(),
        message,
    };

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| to_err(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets: compat.targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| to_err(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets: compat.targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| to_err(e.to_string()))?;

    Ok(printed.code)
}

/// Stage wrapper around [`minify_css`].
///
/// Output that still uses constructs outside the compatibility profile is
/// written anyway; each such construct is logged as a warning.
#[derive(Debug, Clone)]
pub struct MinifyStage {
    compat: Compatibility,
}

impl MinifyStage {
    pub fn new(compat: Compatibility) -> Self {
        Self { compat }
    }
}

impl Stage for MinifyStage {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn transform(&mut self, mut asset: Asset) -> Result<Vec<Asset>> {
        let name = asset.path.to_string_lossy().into_owned();
        asset.contents = minify_css(&asset.contents, &name, self.compat)?;

        for violation in self.compat.violations(&asset.contents) {
            warn!(
                file = %name,
                profile = %self.compat,
                %violation,
                "output uses syntax outside the compatibility profile"
            );
        }
        Ok(vec![asset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minifies_and_drops_comments() {
        let css = "/* banner */\n.nav a {\n  color: #ff0000;\n  margin: 0px 0px 0px 0px;\n}\n";
        let out = minify_css(css, "main.css", Compatibility::Ie8).unwrap();
        assert!(!out.contains("/*"));
        assert!(!out.contains('\n'));
        assert!(out.starts_with(".nav a{"));
        assert!(out.contains("color:red"));
    }

    #[test]
    fn is_idempotent() {
        let css = "body { margin: 0 }\n.a, .b { padding: 1px 2px 1px 2px; color: #000000 }\n";
        let once = minify_css(css, "main.css", Compatibility::Ie8).unwrap();
        let twice = minify_css(&once, "main.css", Compatibility::Ie8).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn parse_errors_are_minify_errors() {
        let err = minify_css("a { color: red; ", "broken.css", Compatibility::Ie8);
        // lightningcss recovers from most malformed input; a hard failure must
        // come back as a structured error rather than a panic.
        if let Err(e) = err {
            assert!(matches!(e, PipelineError::MinifyError { .. }));
        }
    }
}
