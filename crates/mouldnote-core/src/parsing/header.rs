use crate::normalize::{compress_spaces, normalize_key};
use crate::template::{ColumnKey, COLUMNS, INDEX_LABEL};

/// A line consisting of a single header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOnly {
    Column(ColumnKey),
    Index,
}

fn all_labels() -> impl Iterator<Item = &'static str> {
    COLUMNS
        .iter()
        .flat_map(|c| c.labels())
        .chain(std::iter::once(INDEX_LABEL))
}

fn is_label_punctuation(c: char) -> bool {
    matches!(c, '：' | ':' | '|' | '｜')
}

/// Find the table header line: one holding every column label (aliases
/// accepted), else the first line mentioning the part-number label.
pub fn find_header_line(lines: &[&str]) -> Option<usize> {
    let keys: Vec<String> = lines.iter().map(|l| normalize_key(l)).collect();
    keys.iter()
        .position(|k| COLUMNS.iter().all(|c| c.is_contained_in(k)))
        .or_else(|| keys.iter().position(|k| k.contains(COLUMNS[0].label)))
}

/// Remove every header label and label punctuation from `line`, leaving
/// whatever data shared the header's line.
pub fn strip_header_labels(line: &str) -> String {
    let mut out = line.to_string();
    for label in all_labels() {
        out = out.replace(label, " ");
    }
    let out: String = out
        .chars()
        .map(|c| if is_label_punctuation(c) { ' ' } else { c })
        .collect();
    compress_spaces(&out)
}

/// A line made of header labels and nothing else, such as a repeated
/// header after a page break.
pub fn is_header_label_line(line: &str) -> bool {
    let key = normalize_key(line);
    if key.is_empty() {
        return false;
    }
    let mut rest = key;
    for label in all_labels() {
        rest = rest.replace(label, "");
    }
    rest.chars().all(is_label_punctuation)
}

/// Classify a line that holds exactly one label.
pub fn label_only(line: &str) -> Option<LabelOnly> {
    let key = normalize_key(line);
    let key = key.trim_end_matches(is_label_punctuation);
    if key == INDEX_LABEL {
        return Some(LabelOnly::Index);
    }
    COLUMNS
        .iter()
        .find(|c| c.matches_exactly(key))
        .map(|c| LabelOnly::Column(c.key))
}
