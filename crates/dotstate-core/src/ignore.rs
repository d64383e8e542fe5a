//! Ignore matching for target names

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::{Error, Result};

/// Name of the ignore file at the root of the source directory.
pub const IGNORE_FILE: &str = ".dotstateignore";

/// Decides whether a target name (relative to the destination root) is ignored.
pub trait IgnoreMatcher {
    fn matches(&self, relative_path: &str) -> bool;
}

impl<F: Fn(&str) -> bool> IgnoreMatcher for F {
    fn matches(&self, relative_path: &str) -> bool {
        self(relative_path)
    }
}

/// Glob patterns, one per line, as found in [`IGNORE_FILE`].
///
/// Blank lines and lines starting with `#` are skipped. `*` does not cross
/// `/`; `**` does.
#[derive(Debug, Clone)]
pub struct PatternIgnore {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PatternIgnore {
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();
        for line in text.lines() {
            let pattern = line.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| Error::IgnorePattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            builder.add(glob);
            patterns.push(pattern.to_string());
        }
        let set = builder.build().map_err(|e| Error::IgnorePattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;
        Ok(Self { patterns, set })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PatternIgnore {
    fn default() -> Self {
        Self::empty()
    }
}

impl IgnoreMatcher for PatternIgnore {
    fn matches(&self, relative_path: &str) -> bool {
        self.set.is_match(relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let ignore = PatternIgnore::parse("# editor junk\n\n*.swp\n.cache/**\n").unwrap();
        assert_eq!(ignore.patterns(), ["*.swp", ".cache/**"]);
        assert!(ignore.matches("notes.swp"));
        assert!(ignore.matches(".cache/a/b"));
        assert!(!ignore.matches("dir/notes.swp"));
        assert!(!ignore.matches(".bashrc"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = PatternIgnore::parse("a[").unwrap_err();
        assert!(matches!(err, Error::IgnorePattern { .. }));
    }
}
