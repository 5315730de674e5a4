use crate::domain::model::SheetUpdate;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 取得原始 XML 內容的來源
pub trait ContentSource: Send + Sync {
    fn fetch(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// 將二維資料一次寫入試算表
#[async_trait]
pub trait SheetWriter: Send + Sync {
    async fn write_values(
        &self,
        range: &str,
        values: Vec<Vec<serde_json::Value>>,
    ) -> Result<SheetUpdate>;
}
