// src/steps/sourcemap.rs

//! Version 3 source maps for compiled stylesheets.
//!
//! The preprocessor does not report output positions, so mappings are
//! line-level: every output line that opens a rule, an at-rule or holds a
//! declaration is tied to the first occurrence of its leading token in the
//! contributing sources, searching forward from a per-source cursor. That is
//! enough for devtools to land on the right file and the right neighbourhood.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::pipeline::{Asset, Stage};
use crate::source::{relative_path, SourceFile};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

/// Append one base64 VLQ value.
fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Selector,
    Declaration,
    AtRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    kind: TokenKind,
}

impl Token {
    fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Tokens worth searching for in the sources, most specific first.
fn leading_tokens(line: &str) -> Vec<Token> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == "}" || trimmed.starts_with("/*") {
        return Vec::new();
    }

    if trimmed.starts_with('@') {
        return trimmed
            .split(|c: char| c.is_whitespace() || c == '{' || c == ';')
            .next()
            .map(|t| vec![Token::new(t, TokenKind::AtRule)])
            .unwrap_or_default();
    }

    if let Some(selector) = trimmed.strip_suffix('{') {
        // Nested rules are flattened on output; the innermost compound is what
        // appears literally in the source.
        let Some(compound) = selector
            .rsplit(',')
            .next()
            .and_then(|last| last.split_whitespace().last())
            .map(|c| c.trim_start_matches(['>', '+', '~']))
            .filter(|c| !c.is_empty())
        else {
            return Vec::new();
        };

        let mut tokens = vec![Token::new(compound, TokenKind::Selector)];
        // `a:hover` usually comes from `&:hover` inside `a { ... }`.
        if let Some((pos, _)) = compound
            .char_indices()
            .skip(1)
            .find(|(_, c)| matches!(c, ':' | '.' | '['))
        {
            tokens.push(Token::new(
                format!("&{}", &compound[pos..]),
                TokenKind::Selector,
            ));
        }
        return tokens;
    }

    match trimmed.find(':') {
        Some(colon) if !trimmed[..colon].trim().is_empty() => vec![Token::new(
            format!("{}:", trimmed[..colon].trim()),
            TokenKind::Declaration,
        )],
        _ => Vec::new(),
    }
}

/// First occurrence of `token` in `text` at or after `from` that sits on a
/// token boundary.
fn find_token(text: &str, from: usize, token: &Token) -> Option<usize> {
    text[from..]
        .match_indices(token.text.as_str())
        .map(|(i, _)| i + from)
        .find(|&offset| {
            let before_ok = text[..offset].chars().next_back().is_none_or(|c| {
                c.is_whitespace()
                    || matches!(c, '{' | '}' | ';' | ',')
                    || (token.kind == TokenKind::Selector && matches!(c, '>' | '+' | '~'))
            });
            if !before_ok {
                return false;
            }
            if token.kind != TokenKind::Selector {
                return true;
            }
            let after = text[offset + token.text.len()..].trim_start();
            after.starts_with('{') || after.starts_with(',')
        })
}

/// Byte offset → zero-based (line, column).
fn line_col(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    (line, offset - line_starts[line])
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Build a source map for `css`.
///
/// - `file` is the compiled file's name.
/// - `map_dir` is the root-relative directory the map will live in; source
///   paths are written relative to it.
pub fn build_source_map(css: &str, file: &str, sources: &[SourceFile], map_dir: &Path) -> SourceMap {
    let starts: Vec<Vec<usize>> = sources.iter().map(|s| line_starts(&s.contents)).collect();
    let mut cursors = vec![0usize; sources.len()];

    let mut mappings = String::new();
    // Source fields are deltas against the previous emitted segment.
    let (mut prev_src, mut prev_line, mut prev_col) = (0i64, 0i64, 0i64);
    let mut preferred = 0usize;

    for (gen_line, line) in css.lines().enumerate() {
        if gen_line > 0 {
            mappings.push(';');
        }
        let tokens = leading_tokens(line);
        if tokens.is_empty() {
            continue;
        }

        let mut hit = None;
        'search: for token in &tokens {
            let order =
                std::iter::once(preferred).chain((0..sources.len()).filter(|&i| i != preferred));
            for idx in order.filter(|&i| i < sources.len()) {
                let text = &sources[idx].contents;
                let found =
                    find_token(text, cursors[idx], token).or_else(|| find_token(text, 0, token));
                if let Some(offset) = found {
                    hit = Some((idx, offset, token.text.len()));
                    break 'search;
                }
            }
        }

        let Some((idx, offset, len)) = hit else {
            continue;
        };
        cursors[idx] = offset + len;
        preferred = idx;

        let (src_line, src_col) = line_col(&starts[idx], offset);
        let gen_col = line.len() - line.trim_start().len();

        encode_vlq(&mut mappings, gen_col as i64);
        encode_vlq(&mut mappings, idx as i64 - prev_src);
        encode_vlq(&mut mappings, src_line as i64 - prev_line);
        encode_vlq(&mut mappings, src_col as i64 - prev_col);
        prev_src = idx as i64;
        prev_line = src_line as i64;
        prev_col = src_col as i64;
    }

    SourceMap {
        version: 3,
        file: file.to_string(),
        sources: sources
            .iter()
            .map(|s| relative_path(map_dir, &s.path))
            .collect(),
        sources_content: sources.iter().map(|s| s.contents.clone()).collect(),
        names: Vec::new(),
        mappings,
    }
}

/// Emits `<maps_dir>/<file>.map` next to each compiled asset and points the
/// asset at it with a `sourceMappingURL` comment.
#[derive(Debug)]
pub struct SourceMapStage {
    maps_dir: String,
    /// Root-relative directory of the compiled output.
    dest_dir: PathBuf,
}

impl SourceMapStage {
    pub fn new(dest_dir: impl Into<PathBuf>, maps_dir: impl Into<String>) -> Self {
        Self {
            maps_dir: maps_dir.into(),
            dest_dir: dest_dir.into(),
        }
    }
}

impl Stage for SourceMapStage {
    fn name(&self) -> &'static str {
        "sourcemap"
    }

    fn transform(&mut self, mut asset: Asset) -> Result<Vec<Asset>> {
        let file = asset.file_name();
        let map_rel = PathBuf::from(&self.maps_dir).join(format!("{file}.map"));
        let map_dir = self.dest_dir.join(&self.maps_dir);

        let map = build_source_map(&asset.contents, &file, &asset.sources, &map_dir);
        let json = serde_json::to_string(&map)?;

        let url = map_rel.to_string_lossy().replace('\\', "/");
        if !asset.contents.ends_with('\n') {
            asset.contents.push('\n');
        }
        asset.contents.push_str(&format!("/*# sourceMappingURL={url} */\n"));

        let map_asset = Asset::new(asset.path.clone(), map_rel, json);
        Ok(vec![asset, map_asset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_vlq(s: &str) -> Vec<i64> {
        let mut out = Vec::new();
        let (mut value, mut shift) = (0i64, 0);
        for c in s.bytes() {
            let digit = BASE64.iter().position(|&b| b == c).unwrap() as i64;
            value |= (digit & 31) << shift;
            if digit & 32 != 0 {
                shift += 5;
            } else {
                let neg = value & 1 == 1;
                let v = value >> 1;
                out.push(if neg { -v } else { v });
                value = 0;
                shift = 0;
            }
        }
        out
    }

    #[test]
    fn vlq_matches_known_encodings() {
        let mut s = String::new();
        encode_vlq(&mut s, 0);
        encode_vlq(&mut s, 1);
        encode_vlq(&mut s, -1);
        encode_vlq(&mut s, 16);
        assert_eq!(s, "ACDgB");
        assert_eq!(decode_vlq("ACDgB"), vec![0, 1, -1, 16]);
    }

    #[test]
    fn maps_nested_rules_back_to_partials() {
        let sources = vec![
            SourceFile {
                path: PathBuf::from("scss/main.scss"),
                contents: "@import 'nav';\nbody {\n  margin: 0;\n}\n".to_string(),
            },
            SourceFile {
                path: PathBuf::from("scss/_nav.scss"),
                contents: ".nav {\n  a {\n    color: red;\n  }\n}\n".to_string(),
            },
        ];
        let css = ".nav a {\n  color: red;\n}\n\nbody {\n  margin: 0;\n}";

        let map = build_source_map(css, "main.css", &sources, Path::new("css/maps"));
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["../../scss/main.scss", "../../scss/_nav.scss"]);

        let lines: Vec<&str> = map.mappings.split(';').collect();
        assert_eq!(lines.len(), css.lines().count());

        // `.nav a {` → `a {` in _nav.scss at line 1, col 2.
        assert_eq!(decode_vlq(lines[0]), vec![0, 1, 1, 2]);
        // `color: red;` → _nav.scss line 2, col 4 (deltas from previous segment).
        assert_eq!(decode_vlq(lines[1]), vec![2, 0, 1, 2]);
        // `}` and the blank line have no mapping.
        assert!(lines[2].is_empty() && lines[3].is_empty());
        // `body {` → main.scss line 1, col 0.
        assert_eq!(decode_vlq(lines[4]), vec![0, -1, -1, -4]);
    }

    #[test]
    fn parent_selector_suffix_is_a_fallback() {
        let tokens = leading_tokens("a:hover {");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "&:hover");

        let text = "a {\n  &:hover {\n    color: blue;\n  }\n}\n";
        assert_eq!(find_token(text, 0, &tokens[0]), None);
        assert_eq!(find_token(text, 0, &tokens[1]), Some(6));
    }

    #[test]
    fn declarations_ignore_partial_words() {
        let token = Token::new("width:", TokenKind::Declaration);
        assert_eq!(find_token("a { max-width: 1px; width: 2px; }", 0, &token), Some(20));
    }

    #[test]
    fn stage_emits_css_and_map() {
        let mut asset = Asset::new("scss/main.scss", "main.css", "a {\n  color: red;\n}");
        asset.sources = vec![SourceFile {
            path: PathBuf::from("scss/main.scss"),
            contents: "a { color: red; }".to_string(),
        }];

        let mut stage = SourceMapStage::new("css", "maps");
        let out = stage.transform(asset).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].contents.ends_with("/*# sourceMappingURL=maps/main.css.map */\n"));
        assert_eq!(out[1].relative, PathBuf::from("maps/main.css.map"));

        let map: SourceMap = serde_json::from_str(&out[1].contents).unwrap();
        assert_eq!(map.file, "main.css");
        assert_eq!(map.sources_content.len(), 1);
    }
}
