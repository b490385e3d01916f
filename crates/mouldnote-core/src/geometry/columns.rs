use crate::config::ExtractionConfig;
use crate::error::ErrorKind;
use crate::model::{PositionedFragment, TextLine};
use crate::normalize::normalize_key;
use crate::template::{contains_sentinel, COLUMNS};

pub const COLUMN_COUNT: usize = COLUMNS.len();

/// Horizontal extent of a located header label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
}

impl HeaderBox {
    fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    /// `boundaries[i]..boundaries[i + 1]` is column `i`; the last entry is the page width.
    pub boundaries: [f64; COLUMN_COUNT + 1],
    /// First vertical position below the header row.
    pub table_start: f64,
    /// Columns whose position was extrapolated rather than read from a header.
    pub extrapolated: Vec<usize>,
}

impl ColumnLayout {
    /// Index of the column containing `x`, if any.
    pub fn column_of(&self, x: f64) -> Option<usize> {
        (0..COLUMN_COUNT).find(|&i| x >= self.boundaries[i] && x < self.boundaries[i + 1])
    }
}

/// Find each column header on the first line (top to bottom) whose
/// whitespace-free text contains one of its labels.
pub fn locate_headers(lines: &[TextLine]) -> [Option<HeaderBox>; COLUMN_COUNT] {
    let mut found: [Option<HeaderBox>; COLUMN_COUNT] = [None; COLUMN_COUNT];

    for line in lines {
        let mut joined = String::new();
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(line.fragments.len());
        for fragment in &line.fragments {
            let start = joined.len();
            joined.push_str(&normalize_key(&fragment.text));
            spans.push((start, joined.len()));
        }

        for (slot, column) in found.iter_mut().zip(COLUMNS.iter()) {
            if slot.is_some() {
                continue;
            }
            *slot = column
                .labels()
                .find_map(|label| joined.find(label).map(|pos| (pos, pos + label.len())))
                .and_then(|(start, end)| span_box(line, &spans, start, end));
        }
    }

    found
}

fn span_box(line: &TextLine, spans: &[(usize, usize)], start: usize, end: usize) -> Option<HeaderBox> {
    let mut covered = line
        .fragments
        .iter()
        .zip(spans)
        .filter(|(_, span)| span.0 < end && start < span.1)
        .map(|(f, _)| f);
    let first = covered.next()?;
    let mut header = HeaderBox {
        left: first.left,
        right: first.right,
        top: line.vertical_position,
    };
    for f in covered {
        header.left = header.left.min(f.left);
        header.right = header.right.max(f.right);
    }
    Some(header)
}

/// Turn located headers into column boundaries.
///
/// At least one of the first two headers (part number, mould name) must
/// exist. Any other missing header is placed `missing_column_offset` to
/// the right of the previous column's centre.
pub fn resolve_columns(
    headers: &[Option<HeaderBox>; COLUMN_COUNT],
    page_width: f64,
    config: &ExtractionConfig,
) -> Result<ColumnLayout, ErrorKind> {
    let Some(anchor) = headers[..2].iter().position(Option::is_some) else {
        return Err(ErrorKind::MissingTableHeader(format!(
            "neither '{}' nor '{}' found",
            COLUMNS[0].label, COLUMNS[1].label
        )));
    };

    let offset = config.missing_column_offset;
    let mut centres = [0.0_f64; COLUMN_COUNT];
    let mut extrapolated = Vec::new();
    for i in 0..COLUMN_COUNT {
        centres[i] = match &headers[i] {
            Some(h) => h.center(),
            None if i < anchor => {
                let anchor_centre = headers[anchor].map_or(0.0, |h| h.center());
                anchor_centre - offset * (anchor - i) as f64
            }
            None => centres[i - 1] + offset,
        };
        if headers[i].is_none() {
            log::warn!(
                "header '{}' not found, placing column at x={:.1}",
                COLUMNS[i].label,
                centres[i]
            );
            extrapolated.push(i);
        }
    }

    let mut boundaries = [0.0_f64; COLUMN_COUNT + 1];
    boundaries[0] = match &headers[0] {
        Some(h) => h.left - config.gutter_margin,
        None => centres[0] - offset / 2.0,
    }
    .max(0.0);
    for i in 1..COLUMN_COUNT {
        boundaries[i] = (centres[i - 1] + centres[i]) / 2.0;
    }
    boundaries[COLUMN_COUNT] = page_width;

    let header_bottom = headers
        .iter()
        .flatten()
        .map(|h| h.top)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(ColumnLayout {
        boundaries,
        table_start: header_bottom + config.header_gap,
        extrapolated,
    })
}

/// Bottom of the detail table: just above the first trailing-section label
/// below the table start, or the page bottom when there is none.
pub fn find_table_end(fragments: &[PositionedFragment], table_start: f64, page_height: f64) -> f64 {
    fragments
        .iter()
        .filter(|f| f.top >= table_start && contains_sentinel(&normalize_key(&f.text)))
        .map(|f| f.top)
        .min_by(f64::total_cmp)
        .map_or(page_height, |top| (top - 2.0).max(table_start + 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::lines::group_lines;

    fn header_line(skip: &[usize]) -> Vec<PositionedFragment> {
        let labels = [
            ("序号", 20.0, 40.0),
            ("零件图号", 60.0, 120.0),
            ("模具名称", 150.0, 210.0),
            ("模具编号", 240.0, 300.0),
            ("模具厂家", 330.0, 390.0),
            ("移至地方", 420.0, 480.0),
            ("封样单号", 500.0, 560.0),
        ];
        labels
            .iter()
            .enumerate()
            .filter(|(i, _)| !skip.contains(i))
            .map(|(_, &(t, l, r))| PositionedFragment::new(t, l, r, 120.0))
            .collect()
    }

    #[test]
    fn test_full_header_boundaries() {
        let lines = group_lines(&header_line(&[]), 3.0);
        let headers = locate_headers(&lines);
        assert!(headers.iter().all(Option::is_some));
        let layout = resolve_columns(&headers, 600.0, &ExtractionConfig::default()).unwrap();
        assert_eq!(layout.boundaries, [58.0, 135.0, 225.0, 315.0, 405.0, 490.0, 600.0]);
        assert_eq!(layout.table_start, 124.0);
        assert!(layout.extrapolated.is_empty());
        assert_eq!(layout.column_of(95.0), Some(0));
        assert_eq!(layout.column_of(30.0), None);
    }

    #[test]
    fn test_label_split_across_fragments() {
        let frags = vec![
            PositionedFragment::new("零件", 60.0, 90.0, 120.0),
            PositionedFragment::new("图号", 90.0, 120.0, 121.0),
            PositionedFragment::new("模具 名称", 150.0, 210.0, 120.0),
        ];
        let headers = locate_headers(&group_lines(&frags, 3.0));
        let part = headers[0].unwrap();
        assert_eq!((part.left, part.right), (60.0, 120.0));
        assert!(headers[1].is_some());
    }

    #[test]
    fn test_missing_middle_header_extrapolated() {
        // Drop 模具厂家.
        let lines = group_lines(&header_line(&[4]), 3.0);
        let layout = resolve_columns(&locate_headers(&lines), 600.0, &ExtractionConfig::default())
            .unwrap();
        assert_eq!(layout.extrapolated, vec![3]);
        assert_eq!(layout.boundaries[3], 330.0);
        assert_eq!(layout.boundaries[4], 420.0);
    }

    #[test]
    fn test_missing_first_header_extrapolated_backwards() {
        let lines = group_lines(&header_line(&[1]), 3.0);
        let layout = resolve_columns(&locate_headers(&lines), 600.0, &ExtractionConfig::default())
            .unwrap();
        // Mould name centre 180, so part number sits at 60.
        assert_eq!(layout.boundaries[0], 0.0);
        assert_eq!(layout.boundaries[1], 120.0);
    }

    #[test]
    fn test_missing_anchor_headers() {
        let lines = group_lines(&header_line(&[1, 2]), 3.0);
        let err = resolve_columns(&locate_headers(&lines), 600.0, &ExtractionConfig::default());
        assert!(matches!(err, Err(ErrorKind::MissingTableHeader(_))));
    }

    #[test]
    fn test_table_end_at_sentinel() {
        let frags = vec![
            PositionedFragment::new("附件：", 20.0, 60.0, 260.0),
            PositionedFragment::new("附件", 20.0, 60.0, 50.0),
        ];
        assert_eq!(find_table_end(&frags, 124.0, 800.0), 258.0);
        assert_eq!(find_table_end(&[], 124.0, 800.0), 800.0);
        let close = vec![PositionedFragment::new("附件", 0.0, 10.0, 126.0)];
        assert_eq!(find_table_end(&close, 124.0, 800.0), 134.0);
    }
}
