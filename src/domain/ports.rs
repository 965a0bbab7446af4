use crate::domain::model::RowRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Spreadsheet-backed registration persistence, one sheet per event day.
/// `load_header` returning `None` means the sheet has never been written.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn load_header(&self, date_key: &str) -> Result<Option<Vec<String>>>;
    async fn init_header(&self, date_key: &str, columns: &[String]) -> Result<()>;
    async fn append_record(&self, date_key: &str, record: &RowRecord) -> Result<String>;
}

#[async_trait]
pub trait CheckInStore: Send + Sync {
    async fn find_record(&self, date_key: &str, id: &str) -> Result<Option<RowRecord>>;
    async fn mark_attendance(&self, date_key: &str, id: &str, record: &RowRecord) -> Result<()>;
}

/// Confirmation mail. Failures are reported, never fatal to the flow.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, template_data: &serde_json::Value) -> Result<()>;
}

/// Hosts the generated QR badge referenced by the confirmation mail.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, blob: &[u8], key: &str) -> Result<String>;
}

/// QR encoding stays behind this port; the core only hands over the payload.
pub trait QrRenderer: Send + Sync {
    fn render(&self, contents: &str) -> Result<Vec<u8>>;
}
