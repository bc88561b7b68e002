//! Directory pattern matching with named captures.
//!
//! Pattern mini-language:
//! - `~` and `~user` are expanded
//! - `(name)` matches one path segment (no separator)
//! - `{name}` greedily matches anything, separators included
//!
//! Everything else matches literally. Both the pattern and the tested path
//! are normalized to absolute, `/`-separated form without a trailing slash.

use std::collections::HashMap;
use std::path::PathBuf;

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

/// Malformed path or template pattern.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid pattern {pattern}: {reason}")]
pub struct InvalidPattern {
    pub pattern: String,
    pub reason: String,
}

impl InvalidPattern {
    pub(crate) fn new(pattern: &str, reason: impl Into<String>) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whether comparisons ignore letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Windows file systems compare case-insensitively, others do not.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathPattern {
    text: String,
    regex: Regex,
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Result<Self, InvalidPattern> {
        Self::compile_with(pattern, CaseSensitivity::platform_default())
    }

    pub fn compile_with(pattern: &str, case: CaseSensitivity) -> Result<Self, InvalidPattern> {
        let mut text = normalize_path(pattern);
        let mut rgxp = String::from("^");

        while !text.is_empty() {
            let Some(open_at) = text.find(['(', '{']) else {
                rgxp.push_str(&regex::escape(&text));
                break;
            };
            let (lead, rest) = text.split_at(open_at);
            if lead.contains([')', '}']) {
                return Err(InvalidPattern::new(pattern, "unbalanced closing bracket"));
            }
            let open = rest.as_bytes()[0];
            let close = if open == b'{' { '}' } else { ')' };
            let body = &rest[1..];

            let name_len = body
                .find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
                .unwrap_or(body.len());
            if name_len == 0 || !body[name_len..].starts_with(close) {
                return Err(InvalidPattern::new(pattern, "unterminated or unnamed capture"));
            }
            let name = &body[..name_len];
            let snippet = if open == b'{' { ".+" } else { "[^/\\\\]+" };

            rgxp.push_str(&regex::escape(lead));
            rgxp.push_str(&format!("(?P<{name}>{snippet})"));
            text = body[name_len + 1..].to_string();
        }
        rgxp.push('$');

        let regex = RegexBuilder::new(&rgxp)
            .case_insensitive(case == CaseSensitivity::Insensitive)
            .build()
            .map_err(|e| InvalidPattern::new(pattern, e.to_string()))?;
        debug!(pattern = pattern, regex = %rgxp, "Compiled path pattern");

        Ok(Self {
            text: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Match `path` against the pattern, returning every named capture.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let normalized = normalize_path(path);
        let captures = self.regex.captures(&normalized)?;
        Some(
            self.regex
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.to_string(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Absolute, `/`-separated form of `path`: tilde expanded, `.` and `..`
/// resolved lexically, trailing slash dropped.
pub fn normalize_path(path: &str) -> String {
    let expanded = expand_tilde(&path.replace('\\', "/"));
    let absolute = if is_absolute(&expanded) {
        expanded
    } else {
        let cwd = std::env::current_dir()
            .map(|dir| dir.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        format!("{cwd}/{expanded}")
    };

    let (root, rest) = split_root(&absolute);
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("{root}{}", segments.join("/"))
        .trim_end_matches('/')
        .to_string()
}

fn expand_tilde(path: &str) -> String {
    let Some(rest) = path.strip_prefix('~') else {
        return path.to_string();
    };
    let (user, tail) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let home = if user.is_empty() {
        dirs::home_dir()
    } else {
        // Users' homes are assumed to be siblings of the current one
        dirs::home_dir().and_then(|h| h.parent().map(|p| p.join(user)))
    };
    match home {
        Some(home) => format!("{}{tail}", to_slashes(home)),
        None => path.to_string(),
    }
}

fn to_slashes(path: PathBuf) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || drive_prefix(path).is_some()
}

fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':').then(|| &path[..2])
}

fn split_root(path: &str) -> (String, &str) {
    match drive_prefix(path) {
        Some(drive) => (format!("{drive}/"), &path[drive.len()..]),
        None => ("/".to_string(), path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> String {
        to_slashes(dirs::home_dir().unwrap())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/some/where/"), "/some/where");
        assert_eq!(normalize_path("/some/./where/../else"), "/some/else");
        assert_eq!(normalize_path("~/src"), format!("{}/src", home()));
    }

    #[test]
    fn test_suffix_capture() {
        let pat = PathPattern::compile("/home/vader/src/{suffix}").unwrap();
        assert_eq!(pat.matches("/opt/repos/abcd"), None);
        let caps = pat.matches("/home/vader/src/repos/in/tree").unwrap();
        assert_eq!(caps["suffix"], "repos/in/tree");
        assert_eq!(pat.matches("/home/vader/src"), None);
    }

    #[test]
    fn test_segment_capture() {
        let pat = PathPattern::compile("/home/vader/devel/(item)").unwrap();
        assert_eq!(pat.matches("/home/vader/devel/webapp").unwrap()["item"], "webapp");
        assert_eq!(pat.matches("/home/vader/devel/libs/libxuza"), None);
        assert_eq!(pat.matches("/home/vader/devel"), None);
    }

    #[test]
    fn test_mixed_captures() {
        let pat = PathPattern::compile("/opt/repos/(group)/{suffix}").unwrap();
        assert_eq!(pat.matches("/opt/repos/abcd"), None);

        let caps = pat.matches("/opt/repos/apps/mini/webby").unwrap();
        assert_eq!(caps["group"], "apps");
        assert_eq!(caps["suffix"], "mini/webby");
    }

    #[test]
    fn test_tilde_pattern() {
        let pat = PathPattern::compile("~/src/{suffix}").unwrap();
        let caps = pat.matches(&format!("{}/src/repos/here", home())).unwrap();
        assert_eq!(caps["suffix"], "repos/here");
        assert_eq!(pat.matches("~/src/x").unwrap()["suffix"], "x");
    }

    #[test]
    fn test_fixed_pattern() {
        let pat = PathPattern::compile("/home/vader/dev/acme").unwrap();
        assert!(pat.matches("/home/vader/dev/acme").unwrap().is_empty());
        assert!(pat.matches("/home/vader/dev/acme/").unwrap().is_empty());
        assert_eq!(pat.matches("/home/vader/dev/acme/subdir"), None);
        assert_eq!(pat.matches("/home/vader/dev"), None);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PathPattern::compile("/opt/repos/(group/{suffix}").is_err());
        assert!(PathPattern::compile("/opt/{}/x").is_err());
        assert!(PathPattern::compile("/opt/a)b/(x)").is_err());
        // Duplicate capture names are rejected by the regex engine
        assert!(PathPattern::compile("/opt/(x)/(x)").is_err());
    }

    #[test]
    fn test_case_sensitivity() {
        let sensitive = PathPattern::compile_with("/Repos/(name)", CaseSensitivity::Sensitive).unwrap();
        assert_eq!(sensitive.matches("/repos/app"), None);

        let insensitive =
            PathPattern::compile_with("/Repos/(name)", CaseSensitivity::Insensitive).unwrap();
        assert_eq!(insensitive.matches("/repos/App").unwrap()["name"], "App");
    }
}
