use mouldnote_core::model::{ExtractedRow, ExtractionResult};
use mouldnote_core::trace::{ExtractionTrace, TraceSeverity};
use unicode_width::UnicodeWidthStr;

const HEADERS: [&str; 7] = ["#", "零件图号", "模具名称", "模具编号", "模具厂家", "移至地方", "封样单号"];

fn cells(row: &ExtractedRow) -> [String; 7] {
    [
        row.index.to_string(),
        row.part_no.clone(),
        row.mould_name.clone(),
        row.mould_no.clone(),
        row.mould_factory.clone(),
        row.move_to.clone(),
        row.seal_sample_no.clone(),
    ]
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

pub fn format_result(result: &ExtractionResult) -> String {
    let rows: Vec<[String; 7]> = result.rows.iter().map(cells).collect();
    let mut widths = HEADERS.map(UnicodeWidthStr::width);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| pad(v, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(format!("Move date: {}", result.move_date));
    out.push(String::new());
    out.push(line(&HEADERS.map(String::from)[..]));
    out.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(rows.iter().map(|r| line(&r[..])));
    out.join("\n")
}

pub fn print(result: &ExtractionResult) {
    println!("{}", format_result(result));
}

pub fn print_trace(trace: &ExtractionTrace) {
    eprintln!("Trace ({} mode):", trace.mode);
    for step in &trace.steps {
        eprintln!("  {:?}: {}", step.step_type, step.message);
    }
    for w in &trace.warnings {
        let level = match w.severity {
            TraceSeverity::Important => "warning",
            TraceSeverity::Info => "info",
        };
        match w.row_index {
            Some(row) => eprintln!("  {level} (row {row}): {}", w.message),
            None => eprintln!("  {level}: {}", w.message),
        }
    }
}
