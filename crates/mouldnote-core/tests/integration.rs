//! Integration tests for both extraction pipelines and extract_pdf().
//!
//! Uses a MockSource that returns a pre-built PageContent without
//! invoking pdftotext, so these tests run without poppler-utils.

use mouldnote_core::config::ExtractionConfig;
use mouldnote_core::error::{ErrorKind, MouldNoteError};
use mouldnote_core::extraction::{DocumentSource, PageContent};
use mouldnote_core::model::{
    ExtractedRow, ExtractionMode, PositionedFragment, PositionedPage, YAxis,
};
use mouldnote_core::trace::TraceStepType;
use mouldnote_core::{
    extract_pdf, extract_positioned, extract_text, GeometryExtractor, ModePreference,
    TableExtractor,
};

struct MockSource {
    content: PageContent,
}

impl DocumentSource for MockSource {
    fn read_page(&self, _pdf_bytes: &[u8]) -> Result<PageContent, MouldNoteError> {
        Ok(self.content.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

const NOTICE: &str = "美菱移模通知单（外调）
模具移模时间：2024-3-5
编号：MT-2024-001  申请部门：模具科  申请人：张三
序号  零件图号  模具名称  模具编号  模具厂家  移至地方  封样单号
1  C25025.5.12.4  把手盖  ML012302  苏州模具厂  上海工厂  ML-A1-20240101-1
2  B22197.21.1.3  把手座  ML01230271  合肥模具厂  红旗工厂  ML-FYJYD-20241105-1001642
附件：移模清单";

const ROW_X: [(f64, f64); 7] = [
    (25.0, 32.0),
    (62.0, 128.0),
    (160.0, 200.0),
    (240.0, 300.0),
    (330.0, 390.0),
    (420.0, 480.0),
    (495.0, 595.0),
];

fn frag(text: &str, left: f64, right: f64, top: f64) -> PositionedFragment {
    PositionedFragment::new(text, left, right, top)
}

fn row(cells: [&str; 7], top: f64) -> Vec<PositionedFragment> {
    cells
        .iter()
        .zip(ROW_X)
        .map(|(text, (l, r))| frag(text, l, r, top))
        .collect()
}

/// The same notice as `NOTICE`, laid out on a 600x800 page.
fn notice_fragments() -> Vec<PositionedFragment> {
    let mut frags = vec![
        frag("美菱移模通知单（外调）", 200.0, 400.0, 40.0),
        frag("模具移模时间：", 50.0, 140.0, 70.0),
        frag("2024-3-5", 145.0, 200.0, 70.0),
        frag("编号：", 20.0, 50.0, 90.0),
        frag("MT-2024-001", 55.0, 120.0, 90.0),
        frag("申请部门：", 150.0, 200.0, 90.0),
        frag("模具科", 205.0, 240.0, 90.0),
        frag("申请人：", 300.0, 340.0, 90.0),
        frag("张三", 345.0, 370.0, 90.0),
        frag("序号", 20.0, 40.0, 120.0),
        frag("零件图号", 60.0, 120.0, 120.0),
        frag("模具名称", 150.0, 210.0, 120.0),
        frag("模具编号", 240.0, 300.0, 120.0),
        frag("模具厂家", 330.0, 390.0, 120.0),
        frag("移至地方", 420.0, 480.0, 120.0),
        frag("封样单号", 500.0, 560.0, 120.0),
    ];
    frags.extend(row(
        [
            "1",
            "C25025.5.12.4",
            "把手盖",
            "ML012302",
            "苏州模具厂",
            "上海工厂",
            "ML-A1-20240101-1",
        ],
        150.0,
    ));
    frags.extend(row(
        [
            "2",
            "B22197.21.1.3",
            "把手座",
            "ML01230271",
            "合肥模具厂",
            "红旗工厂",
            "ML-FYJYD-20241105-1001642",
        ],
        180.0,
    ));
    frags.push(frag("附件：", 20.0, 60.0, 260.0));
    frags
}

fn page(fragments: Vec<PositionedFragment>) -> PositionedPage {
    PositionedPage {
        width: 600.0,
        height: 800.0,
        y_axis: YAxis::Down,
        fragments,
    }
}

fn without(texts: &[&str]) -> Vec<PositionedFragment> {
    notice_fragments()
        .into_iter()
        .filter(|f| !texts.contains(&f.text.as_str()))
        .collect()
}

fn filler(count: usize) -> Vec<PositionedFragment> {
    (0..count)
        .map(|i| frag("备注", 20.0, 60.0, 300.0 + 20.0 * i as f64))
        .collect()
}

fn expected_rows() -> Vec<ExtractedRow> {
    vec![
        ExtractedRow {
            index: 1,
            part_no: "C25025.5.12.4".into(),
            mould_name: "把手盖".into(),
            mould_no: "ML012302".into(),
            mould_factory: "苏州模具厂".into(),
            move_to: "上海工厂".into(),
            seal_sample_no: "ML-A1-20240101-1".into(),
        },
        ExtractedRow {
            index: 2,
            part_no: "B22197.21.1.3".into(),
            mould_name: "把手座".into(),
            mould_no: "ML01230271".into(),
            mould_factory: "合肥模具厂".into(),
            move_to: "红旗工厂".into(),
            seal_sample_no: "ML-FYJYD-20241105-1001642".into(),
        },
    ]
}

fn config() -> ExtractionConfig {
    ExtractionConfig::default()
}

// ---------------------------------------------------------------------------
// Scenario A: happy path, both pipelines
// ---------------------------------------------------------------------------
#[test]
fn lines_happy_path() {
    let result = extract_text(NOTICE, &config()).unwrap();
    assert_eq!(result.move_date, "2024-03-05");
    assert_eq!(result.rows, expected_rows());
}

#[test]
fn geometry_happy_path() {
    assert_eq!(notice_fragments().len(), 31);
    let result = extract_positioned(&page(notice_fragments()), &config()).unwrap();
    assert_eq!(result.move_date, "2024-03-05");
    assert_eq!(result.rows, expected_rows());
}

#[test]
fn both_pipelines_agree_row_for_row() {
    let geometry = extract_positioned(&page(notice_fragments()), &config()).unwrap();
    let lines = extract_text(NOTICE, &config()).unwrap();
    assert_eq!(geometry, lines);
}

#[test]
fn result_json_shape() {
    let result = extract_text(NOTICE, &config()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["documentKind"], "mould-transfer");
    assert_eq!(json["moveDate"], "2024-03-05");
    assert_eq!(json["rows"][0]["partNo"], "C25025.5.12.4");
    assert_eq!(json["rows"][1]["sealSampleNo"], "ML-FYJYD-20241105-1001642");
}

#[test]
fn bottom_up_coordinates_are_flipped() {
    let flipped: Vec<PositionedFragment> = notice_fragments()
        .into_iter()
        .map(|f| PositionedFragment { top: 800.0 - f.top, ..f })
        .collect();
    let page = PositionedPage {
        y_axis: YAxis::Up,
        ..page(flipped)
    };
    assert_eq!(extract_positioned(&page, &config()).unwrap().rows, expected_rows());
}

#[test]
fn time_after_move_date_is_not_read_as_day() {
    let text = NOTICE.replace("2024-3-5", "2024-3-1 10:30");
    assert_eq!(extract_text(&text, &config()).unwrap().move_date, "2024-03-01");

    let mut frags = without(&["2024-3-5"]);
    frags.push(frag("2024-3-1", 145.0, 200.0, 70.0));
    frags.push(frag("10:30", 205.0, 235.0, 70.0));
    let result = extract_positioned(&page(frags), &config()).unwrap();
    assert_eq!(result.move_date, "2024-03-01");
}

// ---------------------------------------------------------------------------
// Scenario B: header line missing, whole-section scan
// ---------------------------------------------------------------------------
#[test]
fn lines_without_header_recover_rows() {
    let text: String = NOTICE
        .lines()
        .filter(|l| !l.starts_with("序号"))
        .collect::<Vec<_>>()
        .join("\n");
    let (result, trace) = mouldnote_core::LineExtractor::new(config())
        .extract_traced(&text)
        .unwrap();
    assert_eq!(result.rows, expected_rows());
    assert!(trace.has_step(TraceStepType::SectionScan));
}

// ---------------------------------------------------------------------------
// Scenario C: no table
// ---------------------------------------------------------------------------
#[test]
fn lines_without_table() {
    let text = "美菱移模通知单（外调）\n模具移模时间：2024-03-05\n\
        本通知单用于模具外调，请相关部门按时完成移模工作并及时反馈结果。\n\
        请各相关部门负责人签字确认后交回生产管理部门存档备查。";
    let err = extract_text(text, &config()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingTableHeader(_)));
    assert!(err.raw_text.is_some());
}

#[test]
fn geometry_without_anchor_headers() {
    let mut frags = without(&["零件图号", "模具名称"]);
    frags.extend(filler(2));
    let err = extract_positioned(&page(frags), &config()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingTableHeader(_)));
}

#[test]
fn geometry_without_rows() {
    let mut frags = without(&["1", "2", "ML012302", "ML01230271"]);
    frags.extend(filler(4));
    let err = extract_positioned(&page(frags), &config()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoRowsDetected(_)));
}

// ---------------------------------------------------------------------------
// Scenario D: sparse input
// ---------------------------------------------------------------------------
#[test]
fn sparse_inputs_are_rejected() {
    let frags = notice_fragments().into_iter().take(5).collect();
    let err = extract_positioned(&page(frags), &config()).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::InsufficientText { found: 5, required: 30, unit: "fragments" }
    ));

    let err = extract_text("美菱移模通知单\n模具移模时间 2024-03-05", &config()).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::InsufficientText { unit: "characters", .. }
    ));
}

#[test]
fn wrong_template_and_missing_date() {
    let text = NOTICE.replace("美菱移模通知单（外调）", "采购订单");
    let err = extract_text(&text, &config()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnrecognizedTemplate(_)));

    let text = NOTICE.replace("2024-3-5", "待定");
    let err = extract_text(&text, &config()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingDateField { .. }));
}

// ---------------------------------------------------------------------------
// Geometry degradations
// ---------------------------------------------------------------------------
#[test]
fn geometry_falls_back_to_mould_anchors() {
    let mut frags = without(&["1", "2"]);
    frags.extend(filler(2));
    let (result, trace) = GeometryExtractor::new(config())
        .extract_traced(&page(frags))
        .unwrap();
    assert_eq!(result.rows, expected_rows());
    assert!(!trace.warnings.is_empty());
}

#[test]
fn geometry_extrapolates_missing_header() {
    let frags = without(&["模具厂家"]);
    assert_eq!(frags.len(), 30);
    let result = extract_positioned(&page(frags), &config()).unwrap();
    assert_eq!(result.rows, expected_rows());
}

#[test]
fn geometry_collects_wrapped_cells() {
    let mut frags = without(&["C25025.5.12.4", "把手盖"]);
    frags.push(frag("C25025.", 62.0, 128.0, 146.0));
    frags.push(frag("5.12.4", 62.0, 128.0, 156.0));
    frags.push(frag("把手", 160.0, 200.0, 146.0));
    frags.push(frag("盖", 160.0, 200.0, 156.0));
    let result = extract_positioned(&page(frags), &config()).unwrap();
    assert_eq!(result.rows[0].part_no, "C25025.5.12.4");
    assert_eq!(result.rows[0].mould_name, "把手 盖");
}

// ---------------------------------------------------------------------------
// Line-mode supplements
// ---------------------------------------------------------------------------
#[test]
fn seals_backfilled_by_row_order() {
    let text = "美菱移模通知单（外调）
模具移模时间：2024-3-5
序号  零件图号  模具名称  模具编号  模具厂家  移至地方  封样单号
1  C25025.5.12.4  把手盖  ML012302  苏州模具厂  上海工厂
2  B22197.21.1.3  把手座  ML01230271  合肥模具厂  红旗工厂
附件：ML-A1-20240101-1  ML-FYJYD-20241105-1001642";
    let result = extract_text(text, &config()).unwrap();
    assert_eq!(result.rows, expected_rows());
}

#[test]
fn column_block_export() {
    let text = "美菱移模通知单（外调）
模具移模时间：2024-3-5
零件图号
C25025.5.12.4
B22197.21.1.3
模具名称
把手盖
把手座
模具编号
ML012302
ML01230271
模具厂家
苏州模具厂
合肥模具厂
移至地方
上海工厂
红旗工厂
封样单号
ML-A1-20240101-1
ML-FYJYD-20241105-1001642
附件";
    let result = extract_text(text, &config()).unwrap();
    assert_eq!(result.rows, expected_rows());
}

// ---------------------------------------------------------------------------
// extract_pdf() mode selection
// ---------------------------------------------------------------------------
#[test]
fn pdf_auto_prefers_geometry() {
    let source = MockSource {
        content: PageContent {
            page: Some(page(notice_fragments())),
            text: NOTICE.to_string(),
        },
    };
    let (result, trace) = extract_pdf(&[], &source, &config(), ModePreference::Auto).unwrap();
    assert_eq!(trace.mode, ExtractionMode::Geometry);
    assert_eq!(result.rows, expected_rows());
}

#[test]
fn pdf_auto_falls_back_to_lines() {
    let mut frags = without(&[
        "序号", "零件图号", "模具名称", "模具编号", "模具厂家", "移至地方", "封样单号",
    ]);
    frags.extend(filler(6));
    let source = MockSource {
        content: PageContent {
            page: Some(page(frags)),
            text: NOTICE.to_string(),
        },
    };
    let (result, trace) = extract_pdf(&[], &source, &config(), ModePreference::Auto).unwrap();
    assert_eq!(trace.mode, ExtractionMode::Lines);
    assert!(trace
        .warnings
        .iter()
        .any(|w| w.message.starts_with("geometry pipeline failed")));
    assert_eq!(result.rows, expected_rows());

    let err = extract_pdf(&[], &source, &config(), ModePreference::Geometry).unwrap_err();
    match err {
        MouldNoteError::Extraction(e) => {
            assert!(matches!(e.kind, ErrorKind::MissingTableHeader(_)))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn pdf_without_word_boxes_uses_lines() {
    let source = MockSource {
        content: PageContent {
            page: None,
            text: NOTICE.to_string(),
        },
    };
    let (result, trace) = extract_pdf(&[], &source, &config(), ModePreference::Auto).unwrap();
    assert_eq!(trace.mode, ExtractionMode::Lines);
    assert_eq!(result.rows.len(), 2);
}

#[test]
fn pdf_sparse_text_is_not_retried() {
    let source = MockSource {
        content: PageContent {
            page: Some(page(notice_fragments().into_iter().take(3).collect())),
            text: NOTICE.to_string(),
        },
    };
    let err = extract_pdf(&[], &source, &config(), ModePreference::Auto).unwrap_err();
    match err {
        MouldNoteError::Extraction(e) => {
            assert!(matches!(e.kind, ErrorKind::InsufficientText { .. }))
        }
        other => panic!("unexpected error: {other}"),
    }
}
