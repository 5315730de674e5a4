use crate::domain::model::{HeaderSet, Record, SheetWriteOutcome};
use crate::domain::ports::SheetWriter;
use serde_json::Value;

pub const INDEX_HEADER: &str = "#";

/// 建立輸出表格：第一列為 `#` 加欄位名稱，之後每列為 1 起算的序號加各欄位值
pub fn build_export_grid(records: &[Record], headers: &HeaderSet) -> Vec<Vec<Value>> {
    let mut grid = Vec::with_capacity(records.len() + 1);

    let mut header_row = Vec::with_capacity(headers.len() + 1);
    header_row.push(Value::String(INDEX_HEADER.to_string()));
    header_row.extend(headers.iter().map(|h| Value::String(h.to_string())));
    grid.push(header_row);

    for (index, record) in records.iter().enumerate() {
        let mut row = Vec::with_capacity(headers.len() + 1);
        row.push(Value::from(index + 1));
        row.extend(
            headers
                .iter()
                .map(|h| Value::String(record.value_or_empty(h).to_string())),
        );
        grid.push(row);
    }

    grid
}

pub struct SheetsExporter<W: SheetWriter> {
    writer: W,
    anchor: String,
}

impl<W: SheetWriter> SheetsExporter<W> {
    pub fn new(writer: W, anchor: impl Into<String>) -> Self {
        Self {
            writer,
            anchor: anchor.into(),
        }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// 整批寫入，不重試；錯誤轉成 `SheetWriteOutcome::Failed`
    pub async fn export(&self, records: &[Record], headers: &HeaderSet) -> SheetWriteOutcome {
        tracing::info!(
            records_count = records.len(),
            range = %self.anchor,
            "Writing data to Google Sheets"
        );

        let grid = build_export_grid(records, headers);

        match self.writer.write_values(&self.anchor, grid).await {
            Ok(update) => {
                tracing::info!(
                    updated_cells = update.updated_cells,
                    updated_rows = update.updated_rows,
                    updated_columns = update.updated_columns,
                    "Data written successfully"
                );
                SheetWriteOutcome::Written(update)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    category = ?e.category(),
                    severity = ?e.severity(),
                    "Failed to write data to Google Sheets"
                );
                SheetWriteOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
