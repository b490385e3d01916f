//! Text hygiene shared by both pipelines, plus the field normalizer and
//! date extractor built on top of it.

pub mod date;
pub mod fields;
pub mod shapes;

const CHECKBOX_GLYPHS: [char; 5] = ['□', '☐', '✓', '✔', '✅'];

pub fn is_private_use(c: char) -> bool {
    ('\u{E000}'..='\u{F8FF}').contains(&c)
}

/// Hyphen, fullwidth hyphen, em/en dash, non-breaking hyphen, minus sign.
pub fn is_hyphen(c: char) -> bool {
    matches!(c, '-' | '－' | '—' | '–' | '‑' | '−')
}

pub fn normalize_hyphens(s: &str) -> String {
    s.chars().map(|c| if is_hyphen(c) { '-' } else { c }).collect()
}

/// Collapse every whitespace run to a single space and trim.
pub fn compress_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop all whitespace.
pub fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Drop whitespace and private-use glyphs; used for label matching.
pub fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !is_private_use(*c))
        .collect()
}

/// Replace private-use glyphs with spaces.
pub fn strip_private_use(s: &str) -> String {
    s.chars()
        .map(|c| if is_private_use(c) { ' ' } else { c })
        .collect()
}

pub fn strip_checkbox_prefix(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix(CHECKBOX_GLYPHS) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// A line that carries nothing but private-use glyphs.
pub fn is_junk_line(line: &str) -> bool {
    line.chars().any(is_private_use) && normalize_key(line).is_empty()
}

/// Line-mode input hygiene: drop carriage returns, turn NBSP and tabs into spaces.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\u{a0}' | '\t' => ' ',
            other => other,
        })
        .collect()
}

/// Cut `start..end` out of `s`, leaving a single space in its place.
pub fn remove_span(s: &str, start: usize, end: usize) -> String {
    compress_spaces(&format!("{} {}", &s[..start], &s[end..]))
}

/// Byte ranges of the whitespace-separated tokens of `s`.
pub fn token_spans(s: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if let Some(st) = start.take() {
                spans.push((st, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        spans.push((st, s.len()));
    }
    spans
}

pub fn is_ascii_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
