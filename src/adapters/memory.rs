use crate::domain::model::{columns, RowRecord};
use crate::domain::ports::{AssetStore, CheckInStore, Notifier, QrRenderer, RegistrationStore};
use crate::utils::error::{Result, SignupError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SheetData {
    header: Option<Vec<String>>,
    rows: Vec<RowRecord>,
}

/// In-memory stand-in for the sheet API, used by tests and offline runs.
/// Dates listed in `failing` reject writes and reads with a persistence
/// error, which is how the partial-failure paths get exercised.
#[derive(Debug, Default)]
pub struct InMemorySheetStore {
    sheets: Mutex<HashMap<String, SheetData>>,
    failing: HashSet<String>,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, date_key: &str) -> Self {
        self.failing.insert(date_key.to_string());
        self
    }

    fn sheets(&self) -> MutexGuard<'_, HashMap<String, SheetData>> {
        self.sheets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self, date_key: &str) -> Result<()> {
        if self.failing.contains(date_key) {
            return Err(SignupError::Persistence {
                date_key: date_key.to_string(),
                message: "sheet unavailable".to_string(),
            });
        }
        Ok(())
    }

    pub fn header(&self, date_key: &str) -> Option<Vec<String>> {
        self.sheets()
            .get(date_key)
            .and_then(|sheet| sheet.header.clone())
    }

    pub fn rows(&self, date_key: &str) -> Vec<RowRecord> {
        self.sheets()
            .get(date_key)
            .map(|sheet| sheet.rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RegistrationStore for InMemorySheetStore {
    async fn load_header(&self, date_key: &str) -> Result<Option<Vec<String>>> {
        self.check_available(date_key)?;
        Ok(self.header(date_key))
    }

    async fn init_header(&self, date_key: &str, header: &[String]) -> Result<()> {
        self.check_available(date_key)?;
        self.sheets()
            .entry(date_key.to_string())
            .or_default()
            .header = Some(header.to_vec());
        Ok(())
    }

    async fn append_record(&self, date_key: &str, record: &RowRecord) -> Result<String> {
        self.check_available(date_key)?;
        self.sheets()
            .entry(date_key.to_string())
            .or_default()
            .rows
            .push(record.clone());
        Ok(record.get_str(columns::ID).unwrap_or_default().to_string())
    }
}

#[async_trait]
impl CheckInStore for InMemorySheetStore {
    async fn find_record(&self, date_key: &str, id: &str) -> Result<Option<RowRecord>> {
        self.check_available(date_key)?;
        Ok(self.sheets().get(date_key).and_then(|sheet| {
            sheet
                .rows
                .iter()
                .find(|row| row.get_str(columns::ID) == Some(id))
                .cloned()
        }))
    }

    async fn mark_attendance(&self, date_key: &str, id: &str, record: &RowRecord) -> Result<()> {
        self.check_available(date_key)?;
        let mut sheets = self.sheets();
        let row = sheets.get_mut(date_key).and_then(|sheet| {
            sheet
                .rows
                .iter_mut()
                .find(|row| row.get_str(columns::ID) == Some(id))
        });
        match row {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(SignupError::LookupNotFound { id: id.to_string() }),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, serde_json::Value)>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, template_data: &serde_json::Value) -> Result<()> {
        if self.failing {
            return Err(SignupError::Notification {
                message: "mail service down".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((to.to_string(), template_data.clone()));
        Ok(())
    }
}

#[derive(Debug)]
pub struct InMemoryAssetStore {
    base_url: String,
    uploads: Mutex<Vec<String>>,
}

impl InMemoryAssetStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn upload(&self, _blob: &[u8], key: &str) -> Result<String> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

/// Deterministic payload standing in for a real QR encoder.
#[derive(Debug, Default)]
pub struct PlaceholderQr;

impl QrRenderer for PlaceholderQr {
    fn render(&self, contents: &str) -> Result<Vec<u8>> {
        Ok(format!("QR:{contents}").into_bytes())
    }
}
