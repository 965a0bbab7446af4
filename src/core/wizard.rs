use crate::utils::error::{Result, SignupError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

pub type PageData = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct WizardPage {
    pub name: String,
    pub required: Vec<String>,
    dynamic: bool,
}

impl WizardPage {
    pub fn new(name: impl Into<String>, required: &[&str]) -> Self {
        Self {
            name: name.into(),
            required: required.iter().map(|field| field.to_string()).collect(),
            dynamic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardPhase {
    AtPage(usize),
    Submitting,
    Submitted,
    Failed(String),
}

/// 多頁表單的狀態機：頁面順序、前後導航、逐頁收集的資料。
///
/// The page list can be extended after the first page is captured (one page
/// per selected date); navigation is otherwise strictly linear.
#[derive(Debug, Clone)]
pub struct WizardState {
    pages: Vec<WizardPage>,
    data: HashMap<String, PageData>,
    phase: WizardPhase,
}

impl WizardState {
    pub fn new(pages: Vec<WizardPage>) -> Self {
        Self {
            pages,
            data: HashMap::new(),
            phase: WizardPhase::AtPage(0),
        }
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn page_names(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.name.as_str()).collect()
    }

    pub fn current_page(&self) -> Option<&WizardPage> {
        match self.phase {
            WizardPhase::AtPage(index) => self.pages.get(index),
            _ => None,
        }
    }

    fn field_is_present(value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) => !text.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Validates the current page, captures its data and advances. Returns
    /// `Ok(false)` when already on the last page (data is still captured).
    pub fn next(&mut self, page_data: PageData) -> Result<bool> {
        let WizardPhase::AtPage(index) = self.phase else {
            return Ok(false);
        };
        let Some(page) = self.pages.get(index) else {
            return Ok(false);
        };

        let missing: Vec<String> = page
            .required
            .iter()
            .filter(|field| !Self::field_is_present(page_data.get(*field)))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SignupError::Validation { fields: missing });
        }

        self.data.insert(page.name.clone(), page_data);
        if index + 1 < self.pages.len() {
            self.phase = WizardPhase::AtPage(index + 1);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Never discards captured data; `back` then `next` with the same input
    /// reproduces the same accumulated submission.
    pub fn back(&mut self) -> bool {
        match self.phase {
            WizardPhase::AtPage(index) if index > 0 => {
                self.phase = WizardPhase::AtPage(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Splices dynamic pages after `after`. Re-invoking replaces the
    /// previously spliced pages; data captured for pages that disappear in
    /// the replacement is dropped, surviving pages keep theirs.
    pub fn insert_pages(&mut self, after: usize, inserted: Vec<WizardPage>) {
        let surviving: HashSet<&str> = inserted.iter().map(|page| page.name.as_str()).collect();
        let dropped: Vec<String> = self
            .pages
            .iter()
            .filter(|page| page.dynamic && !surviving.contains(page.name.as_str()))
            .map(|page| page.name.clone())
            .collect();
        for name in dropped {
            self.data.remove(&name);
        }

        self.pages.retain(|page| !page.dynamic);
        let at = (after + 1).min(self.pages.len());
        for (offset, mut page) in inserted.into_iter().enumerate() {
            page.dynamic = true;
            self.pages.insert(at + offset, page);
        }

        if let WizardPhase::AtPage(index) = self.phase {
            if index >= self.pages.len() {
                self.phase = WizardPhase::AtPage(self.pages.len().saturating_sub(1));
            }
        }
    }

    pub fn page_data(&self, page: &str) -> Option<&PageData> {
        self.data.get(page)
    }

    pub fn set_field(&mut self, page: &str, field: &str, value: Value) {
        self.data
            .entry(page.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Clears a single bound field, used when a slot deactivates.
    pub fn clear_field(&mut self, page: &str, field: &str) {
        if let Some(page_data) = self.data.get_mut(page) {
            page_data.remove(field);
        }
    }

    /// Merge of all captured pages in page order.
    pub fn accumulated(&self) -> PageData {
        let mut merged = PageData::new();
        for page in &self.pages {
            if let Some(page_data) = self.data.get(&page.name) {
                for (field, value) in page_data {
                    merged.insert(field.clone(), value.clone());
                }
            }
        }
        merged
    }

    /// Double-submit guard: only legal on the last page, and only once.
    pub fn begin_submit(&mut self) -> bool {
        match self.phase {
            WizardPhase::AtPage(index) if index + 1 == self.pages.len() => {
                self.phase = WizardPhase::Submitting;
                true
            }
            _ => false,
        }
    }

    pub fn finish_submit(&mut self, result: std::result::Result<(), String>) {
        if self.phase != WizardPhase::Submitting {
            return;
        }
        self.phase = match result {
            Ok(()) => WizardPhase::Submitted,
            Err(reason) => WizardPhase::Failed(reason),
        };
    }

    /// Ready for the next registrant on the same device.
    pub fn reset(&mut self) {
        self.pages.retain(|page| !page.dynamic);
        self.data.clear();
        self.phase = WizardPhase::AtPage(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info_and_summary() -> WizardState {
        WizardState::new(vec![
            WizardPage::new("info", &["name", "phone"]),
            WizardPage::new("summary", &[]),
        ])
    }

    fn info_data() -> PageData {
        PageData::from([
            ("name".to_string(), json!("Winnie")),
            ("phone".to_string(), json!("91234567")),
        ])
    }

    #[test]
    fn next_rejects_missing_fields_and_stays_put() {
        let mut wizard = info_and_summary();
        let err = wizard
            .next(PageData::from([("name".to_string(), json!("Winnie"))]))
            .unwrap_err();
        match err {
            SignupError::Validation { fields } => assert_eq!(fields, vec!["phone"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*wizard.phase(), WizardPhase::AtPage(0));
    }

    #[test]
    fn blank_and_empty_values_count_as_missing() {
        let mut wizard = info_and_summary();
        let err = wizard
            .next(PageData::from([
                ("name".to_string(), json!("   ")),
                ("phone".to_string(), json!([])),
            ]))
            .unwrap_err();
        match err {
            SignupError::Validation { mut fields } => {
                fields.sort();
                assert_eq!(fields, vec!["name", "phone"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn back_then_next_reproduces_the_same_submission() {
        let mut wizard = info_and_summary();
        assert!(wizard.next(info_data()).unwrap());
        let before = wizard.accumulated();

        assert!(wizard.back());
        assert_eq!(*wizard.phase(), WizardPhase::AtPage(0));
        // Captured data survives the back step.
        assert_eq!(wizard.page_data("info").unwrap()["name"], json!("Winnie"));

        assert!(wizard.next(info_data()).unwrap());
        assert_eq!(wizard.accumulated(), before);
    }

    #[test]
    fn back_on_first_page_is_refused() {
        let mut wizard = info_and_summary();
        assert!(!wizard.back());
        assert_eq!(*wizard.phase(), WizardPhase::AtPage(0));
    }

    #[test]
    fn insert_pages_splices_one_page_per_date() {
        let mut wizard = info_and_summary();
        wizard.insert_pages(
            0,
            vec![WizardPage::new("day1", &[]), WizardPage::new("day2", &[])],
        );
        assert_eq!(wizard.page_names(), vec!["info", "day1", "day2", "summary"]);
    }

    #[test]
    fn reinserting_replaces_dynamic_pages_and_drops_stale_data() {
        let mut wizard = info_and_summary();
        wizard.insert_pages(
            0,
            vec![WizardPage::new("day1", &[]), WizardPage::new("day2", &[])],
        );
        wizard.set_field("day1", "Craft(10:00)", json!(1));
        wizard.set_field("day2", "Baking(11:00)", json!(2));

        wizard.insert_pages(0, vec![WizardPage::new("day2", &[])]);
        assert_eq!(wizard.page_names(), vec!["info", "day2", "summary"]);
        assert!(wizard.page_data("day1").is_none());
        assert_eq!(wizard.page_data("day2").unwrap()["Baking(11:00)"], json!(2));
    }

    #[test]
    fn begin_submit_requires_last_page_and_guards_double_submit() {
        let mut wizard = info_and_summary();
        assert!(!wizard.begin_submit());

        wizard.next(info_data()).unwrap();
        assert!(wizard.begin_submit());
        assert_eq!(*wizard.phase(), WizardPhase::Submitting);

        // The in-flight guard refuses a second trigger.
        assert!(!wizard.begin_submit());

        wizard.finish_submit(Ok(()));
        assert_eq!(*wizard.phase(), WizardPhase::Submitted);
    }

    #[test]
    fn failed_persistence_lands_in_failed_phase() {
        let mut wizard = info_and_summary();
        wizard.next(info_data()).unwrap();
        assert!(wizard.begin_submit());
        wizard.finish_submit(Err("day1: boom".to_string()));
        assert_eq!(
            *wizard.phase(),
            WizardPhase::Failed("day1: boom".to_string())
        );
    }

    #[test]
    fn reset_clears_data_and_dynamic_pages() {
        let mut wizard = info_and_summary();
        wizard.insert_pages(0, vec![WizardPage::new("day1", &[])]);
        wizard.next(info_data()).unwrap();
        wizard.reset();
        assert_eq!(wizard.page_names(), vec!["info", "summary"]);
        assert!(wizard.page_data("info").is_none());
        assert_eq!(*wizard.phase(), WizardPhase::AtPage(0));
    }
}
