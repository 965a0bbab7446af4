use crate::domain::model::{columns, locale_timestamp, RowRecord};
use crate::domain::ports::CheckInStore;
use crate::utils::error::{Result, SignupError};
use crate::utils::validation::validate_record_id;
use chrono::{DateTime, Local};

/// 健康申報流程的狀態。`NotFound` 是死路頁，只能返回。
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInState {
    Idle,
    Ready(RowRecord),
    NotFound,
    Done,
}

/// Looks up a previously issued registration id and records attendance plus
/// the health declaration. A missing record is a state, not an error that
/// escapes this flow.
pub struct CheckInFlow<'a> {
    store: &'a dyn CheckInStore,
    state: CheckInState,
}

impl<'a> CheckInFlow<'a> {
    pub fn new(store: &'a dyn CheckInStore) -> Self {
        Self {
            store,
            state: CheckInState::Idle,
        }
    }

    pub fn state(&self) -> &CheckInState {
        &self.state
    }

    /// Validates the scanned candidate before any remote call, then resolves
    /// it against the day's sheet.
    pub async fn lookup(&mut self, date_key: &str, candidate: &str) -> Result<&CheckInState> {
        let id = validate_record_id(candidate)?;
        match self.store.find_record(date_key, &id).await? {
            Some(record) => {
                tracing::debug!("found registration {id} on {date_key}");
                self.state = CheckInState::Ready(record);
            }
            None => {
                tracing::warn!("no registration for {id} on {date_key}");
                self.state = CheckInState::NotFound;
            }
        }
        Ok(&self.state)
    }

    /// Stamps the attendance timestamp and declaration flag on the looked-up
    /// record and writes it back. Requires the health confirmation.
    pub async fn submit_declaration(
        &mut self,
        date_key: &str,
        healthy: bool,
        at: DateTime<Local>,
    ) -> Result<()> {
        let CheckInState::Ready(record) = &self.state else {
            return Err(SignupError::Validation {
                fields: vec!["id".to_string()],
            });
        };
        if !healthy {
            return Err(SignupError::Validation {
                fields: vec!["healthy".to_string()],
            });
        }

        let mut stamped = record.clone();
        stamped.set(columns::HEALTH_DECLARED, true);
        stamped.set(columns::ATTENDED_AT, locale_timestamp(at));
        let id = stamped.get_str(columns::ID).unwrap_or_default().to_string();
        self.store.mark_attendance(date_key, &id, &stamped).await?;
        tracing::info!("✅ attendance recorded for {id} on {date_key}");
        self.state = CheckInState::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySheetStore;
    use crate::domain::ports::RegistrationStore;
    use serde_json::json;

    async fn seeded_store() -> (InMemorySheetStore, String) {
        let store = InMemorySheetStore::new();
        let id = nanoid::nanoid!();
        let mut record = RowRecord::new();
        record.set(columns::ID, id.as_str());
        record.set(columns::NAME, "Winnie");
        record.set(columns::PHONE, "91234567");
        record.set(columns::ATTENDED_AT, "");
        record.set(columns::HEALTH_DECLARED, "");
        let header: Vec<String> = record.columns().map(str::to_string).collect();
        store.init_header("day1", &header).await.unwrap();
        store.append_record("day1", &record).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn malformed_candidate_never_reaches_the_store() {
        let store = InMemorySheetStore::new();
        let mut flow = CheckInFlow::new(&store);
        let err = flow.lookup("day1", "not a valid id").await.unwrap_err();
        assert!(matches!(err, SignupError::Validation { .. }));
        assert_eq!(*flow.state(), CheckInState::Idle);
    }

    #[tokio::test]
    async fn well_formed_unknown_id_is_a_not_found_state() {
        let (store, _) = seeded_store().await;
        let mut flow = CheckInFlow::new(&store);
        let unknown = nanoid::nanoid!();
        let state = flow.lookup("day1", &unknown).await.unwrap();
        assert_eq!(*state, CheckInState::NotFound);
    }

    #[tokio::test]
    async fn declaration_requires_health_confirmation() {
        let (store, id) = seeded_store().await;
        let mut flow = CheckInFlow::new(&store);
        flow.lookup("day1", &id).await.unwrap();

        let err = flow
            .submit_declaration("day1", false, Local::now())
            .await
            .unwrap_err();
        match err {
            SignupError::Validation { fields } => assert_eq!(fields, vec!["healthy"]),
            other => panic!("unexpected error: {other}"),
        }
        // Still on the form; the record was not touched.
        assert!(matches!(flow.state(), CheckInState::Ready(_)));
    }

    #[tokio::test]
    async fn declaration_stamps_attendance_and_completes() {
        let (store, id) = seeded_store().await;
        let mut flow = CheckInFlow::new(&store);
        flow.lookup("day1", &id).await.unwrap();
        flow.submit_declaration("day1", true, Local::now())
            .await
            .unwrap();
        assert_eq!(*flow.state(), CheckInState::Done);

        let rows = store.rows("day1");
        assert_eq!(rows[0].get(columns::HEALTH_DECLARED), Some(&json!(true)));
        assert_ne!(rows[0].get_str(columns::ATTENDED_AT), Some(""));
    }

    #[tokio::test]
    async fn declaration_without_lookup_is_rejected() {
        let store = InMemorySheetStore::new();
        let mut flow = CheckInFlow::new(&store);
        let err = flow
            .submit_declaration("day1", true, Local::now())
            .await
            .unwrap_err();
        assert!(matches!(err, SignupError::Validation { .. }));
    }
}
