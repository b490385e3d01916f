//! Row state machine for line-only input.
//!
//! At most one row is open at a time. A new ordinal line (or a line led by
//! a part number, when the open row already looks complete) supersedes the
//! open row, which is flushed first. Everything else continues the open
//! row. The last open row is flushed at a trailing sentinel or at the end
//! of input.

use super::header::is_header_label_line;
use crate::finalize::RowDraft;
use crate::normalize::shapes::{
    find_first, find_part_no, is_part_prefix_fragment, is_part_suffix_fragment, MOULD_MATCHERS,
    SEAL_MATCHERS,
};
use crate::normalize::{is_ascii_digits, is_junk_line, normalize_key, remove_span, strip_checkbox_prefix};
use crate::template::contains_sentinel;
use regex::Regex;
use std::sync::LazyLock;

static INDEX_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,3})\s*[.、]?\s*$").expect("valid pattern"));

static ROW_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,3})(?:[.、]\s*|\s+)(\S.*)$").expect("valid pattern"));

/// `1.C25025...`: an ordinal glued to a letter-led code.
static GLUED_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[.、][A-Za-z]").expect("valid pattern"));

#[derive(Debug)]
enum RowState {
    NoOpenRow,
    RowOpen(RowDraft),
}

struct RowParser {
    state: RowState,
    rows: Vec<RowDraft>,
    last_index: u32,
}

impl RowParser {
    fn new() -> Self {
        RowParser {
            state: RowState::NoOpenRow,
            rows: Vec::new(),
            last_index: 0,
        }
    }

    fn open(&mut self, draft: RowDraft) {
        self.last_index = draft.index;
        if let RowState::RowOpen(previous) = std::mem::replace(&mut self.state, RowState::RowOpen(draft)) {
            self.rows.push(previous);
        }
    }

    fn open_row(&mut self) -> Option<&mut RowDraft> {
        match &mut self.state {
            RowState::RowOpen(draft) => Some(draft),
            RowState::NoOpenRow => None,
        }
    }

    fn finish(mut self) -> Vec<RowDraft> {
        if let RowState::RowOpen(last) = self.state {
            self.rows.push(last);
        }
        self.rows
    }

    fn feed(&mut self, line: &str) {
        if let Some(caps) = INDEX_ONLY.captures(line) {
            if let Ok(index) = caps[1].parse() {
                self.open(RowDraft::new(index));
                return;
            }
        }

        let first = line.split_whitespace().next().unwrap_or_default();

        if let Some(open) = self.open_row() {
            if is_part_prefix_fragment(&open.part_no) && is_part_suffix_fragment(first) {
                open.part_no.push_str(first);
                let rest = line.trim_start()[first.len()..].to_string();
                continue_row(open, &rest);
                return;
            }
        }

        if leads_with_part_no(first) {
            let may_open = match &self.state {
                RowState::NoOpenRow => true,
                RowState::RowOpen(open) => open.has_part_and_seal(),
            };
            if may_open {
                let index = self.last_index + 1;
                self.open(parse_row_start(index, line));
                return;
            }
        } else if let Some(caps) = ROW_START.captures(line) {
            if let Ok(index) = caps[1].parse() {
                self.open(parse_row_start(index, &caps[2]));
                return;
            }
        }

        match self.open_row() {
            Some(open) => continue_row(open, line),
            None => log::trace!("ignoring line before the first row: {line}"),
        }
    }
}

fn leads_with_part_no(first: &str) -> bool {
    if first.is_empty() || GLUED_ORDINAL.is_match(first) {
        return false;
    }
    find_part_no(first).is_some_and(|m| m.value == first)
}

/// Pull a seal, mould number and part number (in that order) out of the
/// text, each one removed before the next is searched for.
fn take_identifiers(draft: &mut RowDraft, text: &str) -> String {
    let mut rest = text.to_string();
    if draft.seal_sample_no.is_empty() {
        if let Some(m) = find_first(&SEAL_MATCHERS, &rest) {
            draft.seal_sample_no = m.value;
            rest = remove_span(&rest, m.start, m.end);
        }
    }
    if draft.mould_no.is_empty() {
        if let Some(m) = find_first(&MOULD_MATCHERS, &rest) {
            draft.mould_no = m.value;
            rest = remove_span(&rest, m.start, m.end);
        }
    }
    if draft.part_no.is_empty() {
        if let Some(m) = find_part_no(&rest) {
            draft.part_no = m.value;
            rest = remove_span(&rest, m.start, m.end);
        }
    }
    rest
}

fn residual_tokens(rest: &str) -> Vec<&str> {
    rest.split_whitespace().filter(|t| !is_ascii_digits(t)).collect()
}

/// Last two tokens are factory and destination; anything before is the name.
fn assign_positionally(draft: &mut RowDraft, tokens: &[&str]) {
    match tokens {
        [] => {}
        [name] => draft.mould_name = name.to_string(),
        [name, factory] => {
            draft.mould_name = name.to_string();
            draft.mould_factory = factory.to_string();
        }
        [name @ .., factory, move_to] => {
            draft.mould_name = name.join(" ");
            draft.mould_factory = factory.to_string();
            draft.move_to = move_to.to_string();
        }
    }
}

fn parse_row_start(index: u32, text: &str) -> RowDraft {
    let mut draft = RowDraft::new(index);
    let rest = take_identifiers(&mut draft, text);
    assign_positionally(&mut draft, &residual_tokens(&rest));
    draft
}

fn continue_row(draft: &mut RowDraft, line: &str) {
    let rest = take_identifiers(draft, line);
    let tokens = residual_tokens(&rest);
    if tokens.is_empty() {
        return;
    }
    if !draft.has_free_text() && tokens.len() >= 2 {
        assign_positionally(draft, &tokens);
        return;
    }
    for token in tokens {
        if draft.mould_name.is_empty() {
            draft.mould_name = token.to_string();
        } else if draft.mould_factory.is_empty() {
            draft.mould_factory = token.to_string();
        } else if draft.move_to.is_empty() {
            draft.move_to = token.to_string();
        } else {
            draft.mould_name.push(' ');
            draft.mould_name.push_str(token);
        }
    }
}

/// Run the state machine over the lines below the table header.
pub fn parse_rows(lines: &[String]) -> Vec<RowDraft> {
    let mut parser = RowParser::new();
    for raw in lines {
        if contains_sentinel(&normalize_key(raw)) {
            break;
        }
        if is_junk_line(raw) {
            continue;
        }
        let line = strip_checkbox_prefix(raw).trim();
        if line.is_empty() || is_header_label_line(line) {
            continue;
        }
        parser.feed(line);
    }
    parser.finish()
}
