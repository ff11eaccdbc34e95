//! Manifest parsing and filename stems.
//!
//! The input manifest is a UTF-8 text file with one entry per line in
//! the form `<url> - <title>`. Blank lines and lines starting with `#`
//! are ignored; lines without the ` - ` separator are skipped with a
//! warning. Entry order defines the 1-based index used for
//! deterministic file naming.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Separator between the source URL and the human title.
const SEPARATOR: &str = " - ";

/// One `(url, title)` pair from the input manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Source locator handed to the downloader.
    pub url: String,
    /// Human title; drives the sanitized filename stem.
    pub title: String,
}

/// Parse manifest text into entries.
///
/// Malformed lines (missing ` - `) produce exactly one warning each
/// and no entry. The returned order is line order.
pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match line.split_once(SEPARATOR) {
            Some((url, title)) => entries.push(ManifestEntry {
                url: url.trim().to_string(),
                title: title.trim().to_string(),
            }),
            None => warn!(line = %line, "Skipped malformed manifest line"),
        }
    }

    entries
}

/// Return a filesystem-safe version of `name`.
///
/// Strips every character outside `[A-Za-z0-9_\-.() ]`, trims the
/// result and maps spaces to underscores. Idempotent.
pub fn sanitize_title(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')' | ' '))
        .collect();
    kept.trim().replace(' ', "_")
}

/// Shared filename base linking a video and its thumbnail.
///
/// `index` is the 1-based manifest position; the zero-padded prefix
/// keeps stems unique even when titles collide.
pub fn stem(index: usize, title: &str) -> String {
    format!("{:03}_{}", index, sanitize_title(title))
}

/// Recover a display title from a stem: drop the numeric prefix and
/// map underscores back to spaces.
pub fn display_title(stem: &str) -> String {
    stem.split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(stem)
        .replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        let text = "https://x/a - Foo Bar\nhttps://x/b - Baz\n";
        let entries = parse_manifest(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://x/a");
        assert_eq!(entries[0].title, "Foo Bar");
        assert_eq!(entries[1].title, "Baz");
    }

    #[test]
    fn skips_blank_comment_and_malformed_lines() {
        let text = "\n# comment\nno separator here\nhttps://x/a - Ok\n   \n";
        let entries = parse_manifest(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Ok");
    }

    #[test]
    fn splits_on_first_separator_only() {
        let entries = parse_manifest("https://x/a - A - B\n");
        assert_eq!(entries[0].title, "A - B");
    }

    #[test]
    fn sanitize_strips_and_replaces() {
        assert_eq!(sanitize_title("Foo Bar"), "Foo_Bar");
        assert_eq!(sanitize_title("  a/b:c*d?  "), "abcd");
        assert_eq!(sanitize_title("keep-these_(ok).v2"), "keep-these_(ok).v2");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["Foo Bar!", "  ~x y z~  ", "already_clean", "a  b"] {
            let once = sanitize_title(raw);
            assert_eq!(sanitize_title(&once), once);
        }
    }

    #[test]
    fn sanitize_output_character_class() {
        let out = sanitize_title("héllo wörld / 100% true");
        assert!(out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')')));
    }

    #[test]
    fn stem_is_zero_padded_and_unique_by_index() {
        assert_eq!(stem(1, "Foo Bar"), "001_Foo_Bar");
        assert_eq!(stem(42, "Foo Bar"), "042_Foo_Bar");
        assert_ne!(stem(1, "Same"), stem(2, "Same"));
    }

    #[test]
    fn display_title_round_trip() {
        assert_eq!(display_title("001_Foo_Bar"), "Foo Bar");
        assert_eq!(display_title("no-prefix"), "no-prefix");
    }
}
