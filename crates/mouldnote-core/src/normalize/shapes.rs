//! Ordered cascades of identifier shapes.
//!
//! Each cascade is a list of independent matchers tried in order; the first
//! matcher that finds anything wins. Adding a newly observed variant means
//! appending one matcher (and one test).

use super::{compact, is_ascii_digits, normalize_hyphens, token_spans};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Character class of hyphen-like glyphs, for use inside patterns.
const H: &str = r"[\-－—–‑−]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMatch {
    pub start: usize,
    pub end: usize,
    /// Canonical form of the matched identifier.
    pub value: String,
}

pub struct ShapeMatcher {
    pub name: &'static str,
    regex: Regex,
    canonical: fn(&Captures<'_>) -> String,
}

impl ShapeMatcher {
    fn new(name: &'static str, pattern: &str, canonical: fn(&Captures<'_>) -> String) -> Self {
        ShapeMatcher {
            name,
            regex: Regex::new(pattern).expect("shape patterns are valid"),
            canonical,
        }
    }

    pub fn find(&self, text: &str) -> Option<ShapeMatch> {
        self.regex.captures(text).and_then(|c| self.to_match(&c))
    }

    pub fn find_all(&self, text: &str) -> Vec<ShapeMatch> {
        self.regex
            .captures_iter(text)
            .filter_map(|c| self.to_match(&c))
            .collect()
    }

    fn to_match(&self, caps: &Captures<'_>) -> Option<ShapeMatch> {
        let whole = caps.get(0)?;
        Some(ShapeMatch {
            start: whole.start(),
            end: whole.end(),
            value: (self.canonical)(caps),
        })
    }
}

/// Try each matcher in order and return the first hit.
pub fn find_first(matchers: &[ShapeMatcher], text: &str) -> Option<ShapeMatch> {
    matchers.iter().find_map(|m| m.find(text))
}

/// Every non-overlapping hit of the cascade, in text order. Earlier
/// matchers claim their spans first.
pub fn find_all(matchers: &[ShapeMatcher], text: &str) -> Vec<ShapeMatch> {
    let mut out: Vec<ShapeMatch> = Vec::new();
    for matcher in matchers {
        for m in matcher.find_all(text) {
            if !out.iter().any(|o| m.start < o.end && o.start < m.end) {
                out.push(m);
            }
        }
    }
    out.sort_by_key(|m| m.start);
    out
}

fn cap<'a>(caps: &'a Captures<'_>, i: usize) -> &'a str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn compact_upper(caps: &Captures<'_>) -> String {
    normalize_hyphens(&compact(cap(caps, 0))).to_uppercase()
}

fn whole_match(caps: &Captures<'_>) -> String {
    cap(caps, 0).to_string()
}

fn seal_from_parts(code: &str, date: &str, seq: &str) -> String {
    format!("ML-{}-{}-{}", code.to_uppercase(), date, seq)
}

pub static SEAL_MATCHERS: LazyLock<Vec<ShapeMatcher>> = LazyLock::new(|| {
    let sep = format!(r"(?:\s*{H}\s*|\s+)");
    vec![
        ShapeMatcher::new(
            "seal-canonical",
            &format!(r"(?i)ML\s*{H}\s*([A-Z0-9]+)\s*{H}\s*(\d{{8}})\s*{H}\s*(\d+)"),
            |c| seal_from_parts(cap(c, 1), cap(c, 2), cap(c, 3)),
        ),
        ShapeMatcher::new("seal-pz", r"(?i)PZ[_\-－]?JYFY\d{8,12}", |c| {
            let v = normalize_hyphens(cap(c, 0)).replace('-', "_").to_uppercase();
            match v.strip_prefix("PZJYFY") {
                Some(rest) => format!("PZ_JYFY{rest}"),
                None => v,
            }
        }),
        ShapeMatcher::new(
            "seal-split-date",
            &format!(r"(?i)ML{sep}([A-Z0-9]+){sep}(\d{{6}})\s*(\d{{2}}){sep}(\d+)"),
            |c| {
                let date = format!("{}{}", cap(c, 2), cap(c, 3));
                seal_from_parts(cap(c, 1), &date, cap(c, 4))
            },
        ),
        ShapeMatcher::new(
            "seal-lost-last-hyphen",
            &format!(r"(?i)ML{sep}?([A-Z0-9]+){sep}?(\d{{8}})\s+(\d{{5,}})"),
            |c| seal_from_parts(cap(c, 1), cap(c, 2), cap(c, 3)),
        ),
    ]
});

pub static MOULD_MATCHERS: LazyLock<Vec<ShapeMatcher>> = LazyLock::new(|| {
    vec![
        ShapeMatcher::new("mould-canonical", r"(?i)ML\d+", compact_upper),
        ShapeMatcher::new("mould-spaced", r"(?i)ML\s+\d+", compact_upper),
        ShapeMatcher::new(
            "mould-hyphenated",
            &format!(r"(?i)ML\s*{H}\s*\d+"),
            compact_upper,
        ),
    ]
});

/// Part-number shapes, matched against one whole token at a time.
pub static PART_MATCHERS: LazyLock<Vec<ShapeMatcher>> = LazyLock::new(|| {
    vec![
        ShapeMatcher::new("part-c-prefixed", r"^C\d[0-9A-Za-z_.]*[0-9A-Za-z_]$", whole_match),
        ShapeMatcher::new(
            "part-letter-prefixed",
            r"^[A-Z]\d[0-9A-Za-z_.]*[0-9A-Za-z_]$",
            whole_match,
        ),
        ShapeMatcher::new("part-digit-led", r"^\d[0-9A-Za-z_.]*[0-9A-Za-z_]$", whole_match),
        ShapeMatcher::new("part-dangling-dot", r"^[A-Z]?\d[0-9A-Za-z_.]*\.$", whole_match),
    ]
});

static PURE_DOTTED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:\.\d{1,3})*$").expect("valid pattern"));

static SEAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\d{{2}}{H}\d+$")).expect("valid pattern"));

/// Reject tokens that merely look like part numbers: mould numbers, small
/// dotted numbers, seal suffixes, and short or letterless codes.
pub fn is_likely_part_no(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || s.to_uppercase().starts_with("ML") {
        return false;
    }
    if PURE_DOTTED_NUMBER.is_match(s) || SEAL_SUFFIX.is_match(s) {
        return false;
    }
    if s.chars().count() < 5 || !s.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    s.chars().any(|c| c.is_ascii_alphabetic()) || s.contains('.')
}

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Token cores: each whitespace token with surrounding punctuation trimmed.
fn token_cores(text: &str) -> Vec<(usize, usize)> {
    token_spans(text)
        .into_iter()
        .filter_map(|(start, end)| {
            let token = &text[start..end];
            let lead = token.len() - token.trim_start_matches(|c| !is_code_char(c)).len();
            let trimmed = token[lead..].trim_end_matches(|c| !is_code_char(c));
            if trimmed.is_empty() {
                None
            } else {
                Some((start + lead, start + lead + trimmed.len()))
            }
        })
        .collect()
}

/// Find the first likely part number in `text`, cascade order first, then
/// token order.
pub fn find_part_no(text: &str) -> Option<ShapeMatch> {
    let cores = token_cores(text);
    PART_MATCHERS.iter().find_map(|matcher| {
        cores.iter().find_map(|&(start, end)| {
            let core = &text[start..end];
            if !matcher.regex.is_match(core) || !is_likely_part_no(core) {
                return None;
            }
            Some(ShapeMatch {
                start,
                end,
                value: core.to_string(),
            })
        })
    })
}

/// Every likely part-number token in `text`, in text order.
pub fn find_part_nos(text: &str) -> Vec<ShapeMatch> {
    token_cores(text)
        .into_iter()
        .filter_map(|(start, end)| {
            let core = &text[start..end];
            let shaped = PART_MATCHERS.iter().any(|m| m.regex.is_match(core));
            (shaped && is_likely_part_no(core)).then(|| ShapeMatch {
                start,
                end,
                value: core.to_string(),
            })
        })
        .collect()
}

/// `B22197.21.` style fragment: the first half of a part number split over two lines.
pub fn is_part_prefix_fragment(s: &str) -> bool {
    let s = s.trim();
    s.ends_with('.') && s.chars().any(|c| c.is_ascii_alphabetic())
}

/// `2.1` style fragment: the tail of a split part number.
pub fn is_part_suffix_fragment(s: &str) -> bool {
    let s = s.trim();
    let mut parts = s.split('.');
    let first_ok = parts.next().is_some_and(is_ascii_digits);
    let rest: Vec<&str> = parts.collect();
    first_ok && !rest.is_empty() && rest.iter().all(|p| is_ascii_digits(p))
}

/// A whole-token canonical mould number such as `ML012302`.
pub fn is_canonical_mould_no(s: &str) -> bool {
    let upper = s.to_uppercase();
    upper
        .strip_prefix("ML")
        .is_some_and(is_ascii_digits)
}
