use crate::config::EventConfig;
use crate::domain::model::{columns, RowRecord};
use crate::domain::ports::{CheckInStore, RegistrationStore};
use crate::utils::error::{Result, SignupError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

/// Check-in only ever needs to scan recent registrations, same cap as the
/// original lookup.
const ROW_FETCH_LIMIT: usize = 200;

/// Rows/header client for the spreadsheet API. Each event day maps to an
/// opaque sheet id taken from the config.
pub struct HttpSheetStore {
    client: Client,
    base_url: String,
    sheets: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct HeaderBody {
    columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AppendedBody {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RowsBody {
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl HttpSheetStore {
    pub fn new(base_url: impl Into<String>, sheets: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            sheets,
        }
    }

    pub fn from_config(config: &EventConfig) -> Self {
        let sheets = config
            .days
            .iter()
            .map(|day| (day.key.clone(), day.sheet.clone()))
            .collect();
        Self::new(config.services.sheet_api.clone(), sheets)
    }

    fn sheet_url(&self, date_key: &str, tail: &str) -> Result<String> {
        let sheet = self
            .sheets
            .get(date_key)
            .ok_or_else(|| SignupError::MissingConfigError {
                field: format!("days.{date_key}.sheet"),
            })?;
        Ok(format!(
            "{}/sheets/{}/{}",
            self.base_url.trim_end_matches('/'),
            sheet,
            tail
        ))
    }
}

#[async_trait]
impl RegistrationStore for HttpSheetStore {
    async fn load_header(&self, date_key: &str) -> Result<Option<Vec<String>>> {
        let url = self.sheet_url(date_key, "header")?;
        tracing::debug!("loading header: {url}");
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let header: HeaderBody = response.error_for_status()?.json().await?;
        if header.columns.is_empty() {
            Ok(None)
        } else {
            Ok(Some(header.columns))
        }
    }

    async fn init_header(&self, date_key: &str, header: &[String]) -> Result<()> {
        let url = self.sheet_url(date_key, "header")?;
        tracing::debug!("initializing header: {url}");
        self.client
            .put(&url)
            .json(&serde_json::json!({ "columns": header }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn append_record(&self, date_key: &str, record: &RowRecord) -> Result<String> {
        let url = self.sheet_url(date_key, "rows")?;
        let response = self
            .client
            .post(&url)
            .json(&record.to_json())
            .send()
            .await?
            .error_for_status()?;
        let appended: AppendedBody = response.json().await?;
        Ok(appended.id)
    }
}

#[async_trait]
impl CheckInStore for HttpSheetStore {
    async fn find_record(&self, date_key: &str, id: &str) -> Result<Option<RowRecord>> {
        let url = self.sheet_url(date_key, &format!("rows?limit={ROW_FETCH_LIMIT}"))?;
        let body: RowsBody = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let found = body
            .rows
            .iter()
            .find(|row| row.get(columns::ID).and_then(|value| value.as_str()) == Some(id))
            .map(RowRecord::from_json_map);
        Ok(found)
    }

    async fn mark_attendance(&self, date_key: &str, id: &str, record: &RowRecord) -> Result<()> {
        let url = self.sheet_url(date_key, &format!("rows/{id}"))?;
        self.client
            .patch(&url)
            .json(&record.to_json())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
