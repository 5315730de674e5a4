use crate::adapters::ftp::FtpClient;
use crate::domain::ports::ContentSource;
use crate::utils::error::{Result, SheetCastError};

/// 本地檔案存在時直接讀取，否則視為遠端路徑從 FTP 下載
#[derive(Debug, Clone)]
pub struct FeedSource {
    ftp: FtpClient,
}

impl FeedSource {
    pub fn new(ftp: FtpClient) -> Self {
        Self { ftp }
    }
}

impl ContentSource for FeedSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let is_local_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);

        if is_local_file {
            tracing::info!(path, "Reading local file");
            let content = tokio::fs::read(path).await?;
            return Ok(content);
        }

        // suppaftp 是阻塞式 API，放到 blocking pool 執行
        let client = self.ftp.clone();
        let remote_file = path.to_string();
        tokio::task::spawn_blocking(move || client.download(&remote_file))
            .await
            .map_err(|e| SheetCastError::ProcessingError {
                message: format!("FTP download task failed: {}", e),
            })?
    }
}
