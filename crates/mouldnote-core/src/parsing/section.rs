use super::header::strip_header_labels;
use crate::finalize::RowDraft;
use crate::normalize::shapes::{find_all, find_part_nos, ShapeMatch, MOULD_MATCHERS, SEAL_MATCHERS};
use crate::normalize::{compress_spaces, is_ascii_digits};
use crate::template::{find_sentinel, COLUMNS};

fn overlaps(a: &ShapeMatch, b: &ShapeMatch) -> bool {
    a.start < b.end && b.start < a.end
}

/// Recover rows without a header line by scanning the table section as
/// one string for part number, mould number and seal number anchors.
///
/// Each mould number closes a row: the nearest part number before it
/// starts the row, the text between them is the name, and the first seal
/// after it ends the row. The text between the mould number and the seal
/// holds the factory (first token) and the destination (the rest).
pub fn scan_section(text: &str) -> Vec<RowDraft> {
    let start = text.find(COLUMNS[0].label).unwrap_or(0);
    let body = &text[start..];
    let end = find_sentinel(body).unwrap_or(body.len());
    let section = compress_spaces(&strip_header_labels(&body[..end]));

    let seals = find_all(&SEAL_MATCHERS, &section);
    let moulds: Vec<ShapeMatch> = find_all(&MOULD_MATCHERS, &section)
        .into_iter()
        .filter(|m| !seals.iter().any(|s| overlaps(m, s)))
        .collect();

    let mut drafts: Vec<RowDraft> = Vec::new();
    for (i, mould) in moulds.iter().enumerate() {
        let region_start = seals
            .iter()
            .chain(&moulds[..i])
            .map(|m| m.end)
            .filter(|&e| e <= mould.start)
            .max()
            .unwrap_or(0);
        let region = &section[region_start..mould.start];
        let Some(part) = find_part_nos(region).pop() else {
            log::debug!("mould number {} has no part number before it", mould.value);
            continue;
        };
        let name = region[part.end..].trim();

        let next_mould = moulds.get(i + 1).map_or(section.len(), |m| m.start);
        let seal = seals
            .iter()
            .find(|s| s.start >= mould.end && s.start < next_mould);
        let next_part = find_part_nos(&section[mould.end..next_mould])
            .first()
            .map(|p| mould.end + p.start);
        let tail_end = [seal.map(|s| s.start), next_part]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(next_mould);

        let mut tail: Vec<&str> = section[mould.end..tail_end].split_whitespace().collect();
        if tail.last().is_some_and(|t| t.len() <= 3 && is_ascii_digits(t)) {
            tail.pop();
        }

        drafts.push(RowDraft {
            index: drafts.len() as u32 + 1,
            part_no: part.value,
            mould_name: name.to_string(),
            mould_no: mould.value.clone(),
            mould_factory: tail.first().map(|t| t.to_string()).unwrap_or_default(),
            move_to: tail.get(1..).map(|rest| rest.join(" ")).unwrap_or_default(),
            seal_sample_no: seal.map(|s| s.value.clone()).unwrap_or_default(),
        });
    }
    drafts
}
