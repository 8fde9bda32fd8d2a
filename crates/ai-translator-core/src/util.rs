//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Derive `<stem>-<target>.<ext>` next to `input`, or inside `dir` when given.
pub fn translated_path(input: &Path, target: &str, ext: &str, dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let file_name = format!("{stem}-{target}.{ext}");
    match dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_translated_path_next_to_input() {
        let path = translated_path(Path::new("/data/report.xlsx"), "Spanish", "xlsx", None);
        assert_eq!(path, PathBuf::from("/data/report-Spanish.xlsx"));
    }

    #[test]
    fn test_translated_path_in_output_dir() {
        let path = translated_path(Path::new("/data/report.pdf"), "German", "txt", Some(Path::new("/out")));
        assert_eq!(path, PathBuf::from("/out/report-German.txt"));
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("日本語", 5), "日本語");
        assert_eq!(truncate_chars("", 3), "");
    }
}
