use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sheet column names are the wire contract with the backing spreadsheet;
/// the check-in flow reads rows back by these exact headers.
pub mod columns {
    pub const ID: &str = "id";
    pub const REGISTERED_AT: &str = "登記日期";
    pub const NAME: &str = "姓名";
    pub const PHONE: &str = "電話";
    pub const CONTACT_CHANNEL: &str = "接收資訊";
    pub const REFERRER: &str = "親友姓名";
    pub const COMPANIONS: &str = "同行親友";
    pub const ATTENDED_AT: &str = "出席日期";
    pub const HEALTH_DECLARED: &str = "已填寫健康申報";
}

/// 報名者本人。提交後不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub phone: String,
    pub contact_channel: String,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub name: String,
    pub phone: String,
}

/// Composite booking key. Derived ordering groups entries by (date, timeslot)
/// first, which the ledger relies on when clamping a whole timeslot budget.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: String,
    pub timeslot: String,
    pub workshop: String,
}

impl SlotKey {
    pub fn new(
        date: impl Into<String>,
        timeslot: impl Into<String>,
        workshop: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            timeslot: timeslot.into(),
            workshop: workshop.into(),
        }
    }

    /// Sheet column for this slot, e.g. `Craft(10:00)`.
    pub fn column_name(&self) -> String {
        format!("{}({})", self.workshop, self.timeslot)
    }
}

/// One spreadsheet row as an ordered list of (column, value) pairs. Column
/// order matters: on first append it becomes the sheet's header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    fields: Vec<(String, Value)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        if let Some(entry) = self.fields.iter_mut().find(|(name, _)| *name == column) {
            entry.1 = value;
        } else {
            self.fields.push((column, value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.clone());
        }
        Value::Object(map)
    }

    pub fn from_json_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (name, value) in map {
            record.set(name.clone(), value.clone());
        }
        record
    }
}

/// Result of one submission attempt. Partial persistence is visible, not
/// collapsed into a single pass/fail.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub record_id: String,
    pub persisted: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub badge_url: Option<String>,
    pub notified: bool,
}

impl SubmissionOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.persisted.is_empty()
    }
}

/// en-US locale stamp, matching the values already stored in the sheets.
pub fn locale_timestamp(at: DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
