use crate::core::exporter::INDEX_HEADER;
use crate::domain::model::{HeaderSet, ImportOutcome, ImportSummary, Record};
use crate::utils::error::SheetCastError;
use colored::Colorize;

pub const TITLE: &str = "Sheet Cast - XML Data Import";

/// 終端機輸出的結束碼：成功 (含無資料) 為 0，其他為 1
pub fn exit_code(outcome: &ImportOutcome) -> i32 {
    if outcome.is_success() {
        0
    } else {
        1
    }
}

/// 整份結果都寫到 stdout，重導時標題與錯誤不會分開
pub fn print_outcome(outcome: &ImportOutcome) {
    print!("{}", render_outcome(outcome));
}

pub fn render_outcome(outcome: &ImportOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", TITLE.bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(TITLE.len())));

    match outcome {
        ImportOutcome::Failed { stage, reason } => {
            out.push_str(&format!(
                "{}\n",
                format!("[ERROR] Import failed ({}): {}", stage, reason).red()
            ));
        }
        ImportOutcome::Completed(summary) if summary.records.is_empty() => {
            out.push_str(&format!("{}\n", "[WARNING] No data found in XML file".yellow()));
        }
        ImportOutcome::Completed(summary) => render_summary(&mut out, summary),
    }
    out
}

fn render_summary(out: &mut String, summary: &ImportSummary) {
    out.push_str(&format!("{}\n", "[OK] Import completed successfully".green()));
    out.push_str(&format!("[INFO] Records processed: {}\n", summary.records_processed));
    out.push_str(&format!("[INFO] Records displayed: {}\n", summary.records_displayed));

    if summary.pushed_to_sheets {
        let cells = summary
            .sheet_update
            .as_ref()
            .map(|u| format!(" ({} cells updated)", u.updated_cells))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}\n",
            format!("[OK] Data successfully pushed to Google Sheets{}", cells).green()
        ));
    }

    if summary.records_displayed > 0 {
        out.push('\n');
        out.push_str(&format_preview_table(
            summary.displayed_records(),
            &summary.headers,
        ));
    }

    if let Some(note) = truncation_note(summary) {
        out.push_str(&format!("{}\n", note.dimmed()));
    }
}

/// 配置載入失敗時的輸出：訊息含分類與嚴重度，再附上建議
pub fn render_config_error(e: &SheetCastError) -> String {
    format!(
        "❌ {} (Category: {:?}, Severity: {:?})\n💡 {}\n",
        e.user_friendly_message(),
        e.category(),
        e.severity(),
        e.recovery_suggestion()
    )
}

pub fn truncation_note(summary: &ImportSummary) -> Option<String> {
    summary.is_truncated().then(|| {
        format!(
            "Showing {} of {} records (use --limit to show more)",
            summary.records_displayed, summary.records_processed
        )
    })
}

/// 以 `#` 加欄位名稱為表頭的框線表格，缺少的欄位顯示為空白
pub fn format_preview_table(records: &[Record], headers: &HeaderSet) -> String {
    let mut columns: Vec<String> = Vec::with_capacity(headers.len() + 1);
    columns.push(INDEX_HEADER.to_string());
    columns.extend(headers.iter().map(str::to_string));

    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut row = Vec::with_capacity(columns.len());
            row.push((index + 1).to_string());
            row.extend(headers.iter().map(|h| display_cell(record.value_or_empty(h))));
            row
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, title)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(title.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator = format!(
        "+{}+\n",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&format_row(&columns, &widths));
    out.push_str(&separator);
    for row in &rows {
        out.push_str(&format_row(row, &widths));
    }
    out.push_str(&separator);
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let inner = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width - cell.chars().count();
            format!(" {}{} ", cell, " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("|");
    format!("|{}|\n", inner)
}

fn display_cell(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
