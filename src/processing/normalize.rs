//! Text normalization shared by extraction and matching.

/// Clean raw page text into newline-separated, whitespace-collapsed lines.
///
/// Carriage returns become line breaks, NUL bytes are dropped, non-breaking spaces and tabs are
/// treated as ordinary spaces, and blank lines are removed.
pub fn normalize_page_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    unified
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lower-case a phrase and collapse its inner whitespace for substring matching.
pub fn normalize_phrase(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}

fn collapse_whitespace(line: &str) -> String {
    line.split(|c: char| c.is_whitespace() || c == '\u{0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
