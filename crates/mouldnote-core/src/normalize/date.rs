//! Label-anchored date extraction with widening fallbacks.

use super::compact;
use crate::config::ExtractionConfig;
use crate::error::ErrorKind;
use crate::template::DATE_LABEL;
use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use std::sync::LazyLock;

// Every pattern ends the day at a non-digit, so `2024-3-1 10:30` never
// reads as the 11th. Free-standing patterns also start at a non-digit.

static DATE_DASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:\D|$)").expect("valid pattern")
});

static DATE_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})\s*[-/.]\s*(\d{1,2})\s*[-/.]\s*(\d{1,2})(?:\D|$)")
        .expect("valid pattern")
});

static DATE_CN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})(?:\D|$)")
        .expect("valid pattern")
});

static LABEL_THEN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"模具\s*移模\s*时间[\s\S]{0,80}?(\d{4})\s*[-/.]\s*(\d{1,2})\s*[-/.]\s*(\d{1,2})(?:\D|$)",
    )
    .expect("valid pattern")
});

static LABEL_THEN_CN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"模具\s*移模\s*时间[\s\S]{0,80}?(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})(?:\D|$)")
        .expect("valid pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundDate {
    /// `YYYY-MM-DD`.
    pub value: String,
    /// Which widening step produced the date.
    pub strategy: &'static str,
}

/// Find the labelled move date in the full document text.
///
/// Search order: a character window around the label in folded text (see
/// `fold_whitespace`), the raw text right after the label, the lines
/// around the label's line, and finally the nearest date anywhere in the
/// document.
pub fn extract_move_date(text: &str, config: &ExtractionConfig) -> Result<FoundDate, ErrorKind> {
    let missing = || ErrorKind::MissingDateField {
        label: DATE_LABEL.to_string(),
    };

    let flat: Vec<char> = fold_whitespace(text).chars().collect();
    let label: Vec<char> = DATE_LABEL.chars().collect();
    let label_start = find_chars(&flat, &label).ok_or_else(missing)?;
    let label_end = label_start + label.len();

    let from = label_start.saturating_sub(config.date_window_before);
    let to = (label_end + config.date_window_after).min(flat.len());
    let window: String = flat[from..to].iter().collect();
    if let Some(value) = nearest_date(&window, from, label_start, label_end, &[&*DATE_DASHED]) {
        return Ok(found(value, "label-window"));
    }

    for re in [&*LABEL_THEN_DATE, &*LABEL_THEN_CN_DATE] {
        if let Some(value) = re.captures(text).and_then(|c| date_from_captures(&c)) {
            return Ok(found(value, "after-label"));
        }
    }

    if let Some(value) = date_near_label_line(text, config.date_line_radius) {
        return Ok(found(value, "neighbour-lines"));
    }

    let whole: String = flat.iter().collect();
    nearest_date(&whole, 0, label_start, label_end, &[&*DATE_LOOSE, &*DATE_CN])
        .map(|value| found(value, "whole-document"))
        .ok_or_else(missing)
}

fn found(value: String, strategy: &'static str) -> FoundDate {
    log::debug!("move date {value} found via {strategy}");
    FoundDate { value, strategy }
}

/// Drop whitespace, except that a run of it between two ASCII digits
/// becomes one space. Keeps `模具 移模 时间` matchable as one label while a
/// date never merges with digits on the following line.
fn fold_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut gap = false;
    for c in text.chars() {
        if c.is_whitespace() {
            gap = true;
            continue;
        }
        if gap && c.is_ascii_digit() && out.ends_with(|p: char| p.is_ascii_digit()) {
            out.push(' ');
        }
        gap = false;
        out.push(c);
    }
    out
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Validate and zero-pad a year/month/day triple. Years outside
/// 1900..=2100 are rejected so dotted part numbers never read as dates.
pub fn iso_date(year: &str, month: &str, day: &str) -> Option<String> {
    let year: i32 = year.trim().parse().ok()?;
    if !(1900..=2100).contains(&year) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        year,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )?;
    Some(format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month(),
        date.day()
    ))
}

fn date_from_captures(caps: &Captures<'_>) -> Option<String> {
    iso_date(caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str())
}

/// First date of any accepted shape in a single line.
pub fn parse_date_in(line: &str) -> Option<String> {
    [&*DATE_LOOSE, &*DATE_CN]
        .into_iter()
        .flat_map(|re| re.captures_iter(line))
        .find_map(|c| date_from_captures(&c))
}

/// Pick the valid date closest to the label. `offset` is the char position
/// of `haystack` inside the whole folded text. Ties go to the date after
/// the label.
fn nearest_date(
    haystack: &str,
    offset: usize,
    label_start: usize,
    label_end: usize,
    patterns: &[&Regex],
) -> Option<String> {
    let mut best: Option<((usize, u8), String)> = None;
    for re in patterns {
        for caps in re.captures_iter(haystack) {
            let (Some(year), Some(day)) = (caps.get(1), caps.get(3)) else {
                continue;
            };
            let Some(value) = date_from_captures(&caps) else {
                continue;
            };
            let start = offset + haystack[..year.start()].chars().count();
            let end = offset + haystack[..day.end()].chars().count();
            let rank = if start >= label_end {
                (start - label_end, 0)
            } else if end <= label_start {
                (label_start - end, 1)
            } else {
                continue;
            };
            if best.as_ref().map_or(true, |(r, _)| rank < *r) {
                best = Some((rank, value));
            }
        }
    }
    best.map(|(_, v)| v)
}

fn date_near_label_line(text: &str, radius: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let idx = lines.iter().position(|l| compact(l).contains(DATE_LABEL))?;

    let mut candidates: Vec<((usize, u8), String)> = Vec::new();
    let lo = idx.saturating_sub(radius);
    let hi = (idx + radius).min(lines.len().saturating_sub(1));
    for (i, line) in lines.iter().enumerate().take(hi + 1).skip(lo) {
        if let Some(date) = parse_date_in(line) {
            let rank = if i < idx { (idx - i, 0) } else { (i - idx, 1) };
            candidates.push((rank, date));
        }
    }
    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    candidates.into_iter().next().map(|(_, d)| d)
}
