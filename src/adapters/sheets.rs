use crate::adapters::google_auth::ServiceAccountKey;
use crate::config::SheetsConfig;
use crate::domain::model::SheetUpdate;
use crate::domain::ports::SheetWriter;
use crate::utils::error::{Result, SheetCastError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Google Sheets REST API (v4) 的 values.update
pub struct GoogleSheetsClient {
    client: Client,
    config: SheetsConfig,
}

impl GoogleSheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.application_name.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        tracing::debug!(
            application_name = %config.application_name,
            "Google Sheets client initialized"
        );

        Ok(Self { client, config })
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.config.spreadsheet_id.as_deref()
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| {
            SheetCastError::InvalidConfigValueError {
                field: "sheets.api_base".to_string(),
                value: self.config.api_base.clone(),
                reason: e.to_string(),
            }
        })?;

        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|_| SheetCastError::InvalidConfigValueError {
                        field: "sheets.api_base".to_string(),
                        value: self.config.api_base.clone(),
                        reason: "URL cannot be a base".to_string(),
                    })?;
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        }

        Ok(url)
    }

    /// 憑證在寫入時才載入，缺檔只會讓匯出失敗
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = &self.config.access_token {
            return Ok(token.clone());
        }

        let key = ServiceAccountKey::from_file(&self.config.credentials_path)?;
        key.fetch_access_token(&self.client).await
    }
}

#[async_trait]
impl SheetWriter for GoogleSheetsClient {
    async fn write_values(&self, range: &str, values: Vec<Vec<Value>>) -> Result<SheetUpdate> {
        let spreadsheet_id = self.config.require_spreadsheet_id()?;
        let url = self.values_url(spreadsheet_id, range)?;
        let token = self.access_token().await?;

        tracing::debug!(
            spreadsheet_id = %spreadsheet_id,
            range,
            rows = values.len(),
            "Sending values update"
        );

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SheetCastError::SheetsApiError {
                status: status.as_u16(),
                message: api_error_message(&text, status.canonical_reason()),
            });
        }

        let update: SheetUpdate = response.json().await?;
        tracing::debug!(?update, "Google Sheets API response received");
        Ok(update)
    }
}

/// 取出 `{"error": {"message": ...}}`，格式不符時退回原始內容
fn api_error_message(body: &str, fallback: Option<&str>) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match parsed {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => fallback.unwrap_or("unknown error").to_string(),
    }
}
