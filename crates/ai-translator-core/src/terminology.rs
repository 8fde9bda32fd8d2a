//! `source=target` glossaries injected into prompts.
//!
//! Terminology is advisory text for the model, not a deterministic
//! substitution: keys are case-sensitive literals and the model may or may
//! not honor them.

use std::path::Path;

use crate::error::{Error, Result};

/// Ordered source-term → target-term mapping with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminology {
    entries: Vec<(String, String)>,
}

impl Terminology {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Parse glossary text: one `source=target` per line.
    ///
    /// Blank lines and lines without `=` are skipped. The first `=` splits
    /// key from value, so values may contain `=`. A repeated key keeps its
    /// first position and takes the later value.
    pub fn parse(content: &str) -> Self {
        let mut terminology = Self::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((source, target)) = line.split_once('=') else {
                tracing::debug!("Skipping terminology line {} without '='", line_no + 1);
                continue;
            };
            terminology.insert(source.trim(), target.trim());
        }
        terminology
    }

    /// Load a UTF-8 glossary file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::TerminologyLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let terminology = Self::parse(&content);
        tracing::info!("Loaded {} terminology entries from {}", terminology.len(), path.display());
        Ok(terminology)
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        let target = target.into();
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == source) {
            entry.1 = target;
        } else {
            self.entries.push((source, target));
        }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, t)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `- source → target` lines for prompts.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(source, target)| format!("- {source} → {target}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for Terminology {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut terminology = Self::new();
        for (source, target) in iter {
            terminology.insert(source, target);
        }
        terminology
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_malformed_lines() {
        let terminology = Terminology::parse("API=API\nthis line has no separator\n\nuser=usuario\n");
        assert_eq!(terminology.len(), 2);
        assert_eq!(terminology.get("API"), Some("API"));
        assert_eq!(terminology.get("user"), Some("usuario"));
    }

    #[test]
    fn test_first_equals_splits() {
        let terminology = Terminology::parse("a=b=c");
        assert_eq!(terminology.get("a"), Some("b=c"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let terminology = Terminology::parse("User=Usuario\nuser=usuario");
        assert_eq!(terminology.len(), 2);
        assert_eq!(terminology.get("User"), Some("Usuario"));
    }

    #[test]
    fn test_duplicate_key_takes_later_value() {
        let terminology = Terminology::parse("cell=celda\nrow=fila\ncell=casilla");
        assert_eq!(terminology.len(), 2);
        assert_eq!(terminology.render(), "- cell → casilla\n- row → fila");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, "API=API\nuser=usuario\nbroken line\n").unwrap();

        let terminology = Terminology::from_file(&path).unwrap();
        assert_eq!(terminology.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Terminology::from_file("/nonexistent/terms.txt").unwrap_err();
        assert!(matches!(err, Error::TerminologyLoad { .. }));
    }
}
