use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 由 XML 根節點的一個子元素攤平而成的一列資料，欄位保持文件順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub data: IndexMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重複的 key 保留原本位置，值以最後一次為準
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// 缺少的欄位回傳空字串，讓輸出保持矩形
    pub fn value_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// 一批 Record 所有欄位名稱的聯集，依首次出現順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderSet {
    names: IndexSet<String>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 回傳是否為新欄位
    pub fn push(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub total_records: usize,
    pub fields: Vec<String>,
    pub sample_record: Record,
}

/// 一次匯入執行的參數
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub file_path: String,
    pub limit: usize,
    pub push_to_sheets: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Fetch,
    Parse,
    Extract,
    Export,
    Internal,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImportStage::Fetch => "fetch",
            ImportStage::Parse => "parse",
            ImportStage::Extract => "extract",
            ImportStage::Export => "export",
            ImportStage::Internal => "internal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub records: Vec<Record>,
    pub headers: HeaderSet,
    pub records_processed: usize,
    pub records_displayed: usize,
    pub pushed_to_sheets: bool,
    pub sheet_update: Option<SheetUpdate>,
}

impl ImportSummary {
    pub fn displayed_records(&self) -> &[Record] {
        &self.records[..self.records_displayed.min(self.records.len())]
    }

    pub fn is_truncated(&self) -> bool {
        self.records_displayed < self.records_processed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Completed(ImportSummary),
    Failed { stage: ImportStage, reason: String },
}

impl ImportOutcome {
    pub fn failure(stage: ImportStage, reason: impl Into<String>) -> Self {
        ImportOutcome::Failed {
            stage,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Completed(_))
    }
}

/// Sheets API 回報的更新數量
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetUpdate {
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_cells: u64,
    #[serde(default)]
    pub updated_rows: u64,
    #[serde(default)]
    pub updated_columns: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetWriteOutcome {
    Written(SheetUpdate),
    Failed { reason: String },
}

impl SheetWriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SheetWriteOutcome::Written(_))
    }
}
