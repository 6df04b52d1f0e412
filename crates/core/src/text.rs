//! Text block cleanup shared by every format adapter.
//!
//! Extractors hand back text exactly as the container stores it. Before it
//! becomes part of a [`NormalizedContent`](crate::NormalizedContent) it is
//! composed to NFC, line endings are unified and horizontal whitespace is
//! collapsed, so the corpus looks the same regardless of the source format.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of spaces and tabs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

/// Regex to squeeze three or more consecutive newlines into a single blank line.
static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Clean one text block.
///
/// - Unicode NFC composition
/// - `\r\n` and `\r` become `\n`
/// - Spaces, tabs and non-breaking spaces collapse to one space
/// - Each line is trimmed; more than one blank line in a row becomes one
/// - Leading and trailing blank lines are removed
pub fn clean_block(text: &str) -> String {
    let composed: String = text.nfc().collect();
    let unified = composed.replace("\r\n", "\n").replace('\r', "\n");

    let lines = unified
        .lines()
        .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_LINES_REGEX
        .replace_all(&lines, "\n\n")
        .trim_matches('\n')
        .to_string()
}

/// Clean a single table cell: like [`clean_block`] but on one line.
pub fn clean_cell(text: &str) -> String {
    clean_block(text)
        .lines()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
