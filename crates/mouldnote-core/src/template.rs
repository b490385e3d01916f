//! Fixed vocabulary of the mould transfer notice template.

use serde::{Deserialize, Serialize};

pub const DOCUMENT_KIND: &str = "mould-transfer";

pub const DATE_LABEL: &str = "模具移模时间";

/// Header of the row-ordinal column. Not a data column.
pub const INDEX_LABEL: &str = "序号";

/// Section labels that end the detail table.
pub const TRAILING_SENTINELS: [&str; 2] = ["附件", "报告审批意见"];

const TITLE_MARKERS: [&str; 2] = ["美菱移模通知单", "移模通知单（外调）"];

/// Logical column of the detail table, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKey {
    PartNo,
    MouldName,
    MouldNo,
    MouldFactory,
    MoveTo,
    SealSampleNo,
}

/// How the fragments of one cell are glued back together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Identifiers: never legitimately space-separated.
    Adjacent,
    /// Free text: sub-lines separated by single spaces.
    Spaced,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub key: ColumnKey,
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub join: JoinPolicy,
}

impl ColumnSpec {
    /// All accepted spellings, canonical label first.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.label).chain(self.aliases.iter().copied())
    }

    pub fn matches_exactly(&self, compact: &str) -> bool {
        self.labels().any(|l| l == compact)
    }

    pub fn is_contained_in(&self, compact: &str) -> bool {
        self.labels().any(|l| compact.contains(l))
    }
}

pub const COLUMNS: [ColumnSpec; 6] = [
    ColumnSpec {
        key: ColumnKey::PartNo,
        label: "零件图号",
        aliases: &[],
        join: JoinPolicy::Adjacent,
    },
    ColumnSpec {
        key: ColumnKey::MouldName,
        label: "模具名称",
        aliases: &[],
        join: JoinPolicy::Spaced,
    },
    ColumnSpec {
        key: ColumnKey::MouldNo,
        label: "模具编号",
        aliases: &[],
        join: JoinPolicy::Adjacent,
    },
    ColumnSpec {
        key: ColumnKey::MouldFactory,
        label: "模具厂家",
        aliases: &[],
        join: JoinPolicy::Spaced,
    },
    ColumnSpec {
        key: ColumnKey::MoveTo,
        label: "移至地方",
        aliases: &["移至地点"],
        join: JoinPolicy::Spaced,
    },
    ColumnSpec {
        key: ColumnKey::SealSampleNo,
        label: "封样单号",
        aliases: &["封样号"],
        join: JoinPolicy::Adjacent,
    },
];

pub fn column_position(key: ColumnKey) -> usize {
    COLUMNS
        .iter()
        .position(|c| c.key == key)
        .unwrap_or_default()
}

/// Check whitespace-free document text for the notice title.
pub fn has_title_marker(compact: &str) -> bool {
    TITLE_MARKERS.iter().any(|m| compact.contains(m))
        || (compact.contains("移模通知单") && compact.contains("外调"))
}

pub fn contains_sentinel(text: &str) -> bool {
    TRAILING_SENTINELS.iter().any(|s| text.contains(s))
}

/// Byte offset of the earliest trailing sentinel in `text`.
pub fn find_sentinel(text: &str) -> Option<usize> {
    TRAILING_SENTINELS
        .iter()
        .filter_map(|s| text.find(s))
        .min()
}
