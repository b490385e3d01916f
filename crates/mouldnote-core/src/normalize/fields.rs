use super::shapes::{self, find_first, MOULD_MATCHERS, SEAL_MATCHERS};
use super::{compact, compress_spaces, is_ascii_digits, normalize_hyphens, normalize_key, strip_private_use};
use regex::Regex;
use std::sync::LazyLock;

/// `2.1B22197.21.`: suffix group emitted before the prefix group.
static REVERSED_PART_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)+)([A-Z].*\.)$").expect("valid pattern"));

static SEAL_TAIL_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\d{2}\s*[\-－—–‑−]\s*\d+(?:\s|$)").expect("valid pattern"));

/// Canonical part number: no whitespace, plain hyphens, prefix/suffix groups
/// in natural order.
pub fn normalize_part_no(raw: &str) -> String {
    let s = compact(&normalize_hyphens(raw));
    match REVERSED_PART_NO.captures(&s) {
        Some(caps) => format!("{}{}", &caps[2], &caps[1]),
        None => s,
    }
}

/// Canonical mould number via the mould cascade; unmatched text is only compacted.
pub fn normalize_mould_no(raw: &str) -> String {
    let key = normalize_key(raw);
    match find_first(&MOULD_MATCHERS, &key) {
        Some(m) => m.value,
        None => normalize_hyphens(&key),
    }
}

/// The seal number found in `raw`, if any matcher of the cascade recognizes one.
pub fn extract_seal_no(raw: &str) -> Option<String> {
    let found = find_first(&SEAL_MATCHERS, raw)?;
    log::trace!("seal '{}' matched in '{}'", found.value, raw);
    Some(found.value)
}

/// Canonical seal number; unmatched text is compacted with plain hyphens.
pub fn normalize_seal_no(raw: &str) -> String {
    extract_seal_no(raw).unwrap_or_else(|| normalize_hyphens(&normalize_key(raw)))
}

/// Clean a mould name: private-use glyphs out, whitespace collapsed, and a
/// leading row ordinal removed. A name the cell repeated after its ordinal
/// (`2 把手盖 2 把手盖`) is kept once, and consecutive duplicate words
/// collapse. Other numbers inside the name stay.
pub fn normalize_mould_name(raw: &str) -> String {
    let cleaned = compress_spaces(&strip_private_use(raw));
    let mut tokens: Vec<&str> = cleaned.split(' ').filter(|t| !t.is_empty()).collect();

    if let Some(&first) = tokens.first() {
        if is_ascii_digits(first) && tokens.len() > 1 {
            tokens.remove(0);
            if let Some(k) = tokens.iter().position(|t| *t == first) {
                if tokens[..k] == tokens[k + 1..] {
                    tokens.truncate(k);
                }
            }
        }
    }

    let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
    for t in tokens {
        if out.last() != Some(&t) {
            out.push(t);
        }
    }
    out.join(" ")
}

/// Remove text that leaked into a name from neighbouring cells: whole
/// tokens equal to another field of the row, seal-shaped fragments and the
/// row's own index at either end of the name.
pub fn strip_leaked_fields(name: &str, others: &[&str], index: u32) -> String {
    let mut s = compress_spaces(&strip_private_use(name));
    for m in shapes::find_all(&SEAL_MATCHERS, &s).into_iter().rev() {
        s.replace_range(m.start..m.end, " ");
    }
    let s = SEAL_TAIL_FRAGMENT.replace_all(&s, " ");

    let index = index.to_string();
    let mut kept: Vec<&str> = s
        .split_whitespace()
        .filter(|t| !others.iter().any(|o| !o.is_empty() && o == t))
        .collect();
    if kept.len() > 1 && kept.last() == Some(&index.as_str()) {
        kept.pop();
    }
    if kept.len() > 1 && kept.first() == Some(&index.as_str()) {
        kept.remove(0);
    }
    normalize_mould_name(&kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_no_whitespace_removed() {
        assert_eq!(normalize_part_no(" C25025. 5.12.4 "), "C25025.5.12.4");
    }

    #[test]
    fn test_part_no_reversed_groups_swapped() {
        assert_eq!(normalize_part_no("2.1B22197.21."), "B22197.21.2.1");
    }

    #[test]
    fn test_part_no_idempotent() {
        let once = normalize_part_no("2.1B22197.21.");
        assert_eq!(normalize_part_no(&once), once);
    }

    #[test]
    fn test_seal_idempotent() {
        assert_eq!(normalize_seal_no("ML-A1-20240101-1"), "ML-A1-20240101-1");
    }

    #[test]
    fn test_seal_hyphen_glyph_equivalence() {
        let variants = [
            "ML-A1-20240101-1",
            "ML－A1－20240101－1",
            "ML—A1–20240101‑1",
            "ML − A1 − 20240101 − 1",
        ];
        for v in variants {
            assert_eq!(normalize_seal_no(v), "ML-A1-20240101-1", "variant {v}");
        }
    }

    #[test]
    fn test_mould_hyphen_glyph_equivalence() {
        assert_eq!(normalize_mould_no("ML－012302"), normalize_mould_no("ML—012302"));
        assert_eq!(normalize_mould_no("ML 012302"), "ML012302");
        assert_eq!(normalize_mould_no("ML012302"), "ML012302");
    }

    #[test]
    fn test_unmatched_seal_compacted() {
        assert_eq!(normalize_seal_no(" AB － 12 "), "AB-12");
        assert!(extract_seal_no("上海工厂").is_none());
    }

    #[test]
    fn test_mould_name_duplicated_index() {
        assert_eq!(normalize_mould_name("2 把手盖 2 把手盖"), "把手盖");
        assert_eq!(normalize_mould_name("把手\u{E011}盖板"), "把手 盖板");
        assert_eq!(normalize_mould_name("把手盖"), "把手盖");
    }

    #[test]
    fn test_mould_name_lone_number_kept() {
        assert_eq!(normalize_mould_name("12"), "12");
    }

    #[test]
    fn test_mould_name_inner_number_kept() {
        assert_eq!(normalize_mould_name("1 把手 1 号"), "把手 1 号");
    }

    #[test]
    fn test_strip_leaked_fields() {
        let name = "把手盖 苏州模具厂 ML-A1-20240101-1 1";
        assert_eq!(strip_leaked_fields(name, &["苏州模具厂"], 1), "把手盖");
        assert_eq!(strip_leaked_fields("1 把手 1 号", &[], 1), "把手 1 号");
    }

    #[test]
    fn test_strip_leaked_seal_tail() {
        assert_eq!(strip_leaked_fields("推杆 01-1001642", &[], 3), "推杆");
    }
}
