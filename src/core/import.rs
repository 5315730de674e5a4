use crate::core::exporter::SheetsExporter;
use crate::core::tabularizer;
use crate::domain::model::{ImportOptions, ImportOutcome, ImportStage, ImportSummary, SheetWriteOutcome};
use crate::domain::ports::{ContentSource, SheetWriter};
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;

/// 依序執行 取得 → 解析 → 攤平 → (選擇性) 匯出 → 彙總
pub struct ImportHandler<S: ContentSource, W: SheetWriter> {
    source: S,
    exporter: SheetsExporter<W>,
}

impl<S: ContentSource, W: SheetWriter> ImportHandler<S, W> {
    pub fn new(source: S, exporter: SheetsExporter<W>) -> Self {
        Self { source, exporter }
    }

    /// 任何階段的失敗都轉成 `ImportOutcome::Failed`，不會往外拋
    pub async fn handle(&self, options: &ImportOptions) -> ImportOutcome {
        tracing::info!(
            file_path = %options.file_path,
            limit = options.limit,
            push_to_sheets = options.push_to_sheets,
            "Starting spreadsheet import"
        );

        match self.run(options).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    category = ?e.category(),
                    severity = ?e.severity(),
                    "Import handler failed"
                );
                ImportOutcome::failure(ImportStage::Internal, e.to_string())
            }
        }
    }

    async fn run(&self, options: &ImportOptions) -> Result<ImportOutcome> {
        validate_non_empty_string("file", &options.file_path)?;

        // 取得
        let raw = match self.source.fetch(&options.file_path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    file_path = %options.file_path,
                    error = %e,
                    category = ?e.category(),
                    severity = ?e.severity(),
                    "Failed to retrieve XML content"
                );
                return Ok(ImportOutcome::failure(
                    ImportStage::Fetch,
                    format!("Failed to retrieve XML content: {}", e),
                ));
            }
        };

        // 解析
        let document = match tabularizer::parse(&raw) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(error = %e, severity = ?e.severity(), "XML parsing failed");
                return Ok(ImportOutcome::failure(
                    ImportStage::Parse,
                    format!("Failed to parse XML content: {}", e),
                ));
            }
        };

        // 攤平
        let records = tabularizer::extract_records(&document);
        let headers = tabularizer::derive_headers(&records);

        if records.is_empty() {
            tracing::info!("No data found in XML file");
            return Ok(ImportOutcome::Completed(ImportSummary {
                records,
                headers,
                records_processed: 0,
                records_displayed: 0,
                pushed_to_sheets: false,
                sheet_update: None,
            }));
        }

        let summary = tabularizer::summarize(&records);
        tracing::debug!(
            total_records = summary.total_records,
            fields = ?summary.fields,
            sample_record = %serde_json::to_string(&summary.sample_record)?,
            "Data summary"
        );

        // 匯出失敗只記錄，不影響已取得的資料
        let mut pushed_to_sheets = false;
        let mut sheet_update = None;
        if options.push_to_sheets {
            match self.exporter.export(&records, &headers).await {
                SheetWriteOutcome::Written(update) => {
                    pushed_to_sheets = true;
                    sheet_update = Some(update);
                }
                SheetWriteOutcome::Failed { reason } => {
                    tracing::error!(error = %reason, "Failed to push data to Google Sheets");
                }
            }
        }

        let records_processed = records.len();
        let records_displayed = options.limit.min(records_processed);

        tracing::info!(
            records_processed,
            records_displayed,
            pushed_to_sheets,
            "Spreadsheet import completed successfully"
        );

        Ok(ImportOutcome::Completed(ImportSummary {
            records,
            headers,
            records_processed,
            records_displayed,
            pushed_to_sheets,
            sheet_update,
        }))
    }
}
