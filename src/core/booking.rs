use crate::core::ledger::{SlotEvent, SlotLedger};
use crate::core::wizard::WizardState;
use crate::domain::model::{columns, locale_timestamp, Attendee, Companion, RowRecord, SlotKey, SubmissionOutcome};
use crate::domain::ports::{AssetStore, Notifier, QrRenderer, RegistrationStore};
use crate::utils::error::{Result, SignupError};
use chrono::Local;
use nanoid::nanoid;
use serde_json::json;

/// External collaborators for the final submission step, constructed once per
/// process and passed in explicitly.
pub struct BookingServices<'a> {
    pub store: &'a dyn RegistrationStore,
    pub notifier: &'a dyn Notifier,
    pub assets: &'a dyn AssetStore,
    pub qr: &'a dyn QrRenderer,
    pub badge_prefix: &'a str,
}

/// Bridges selection events to the ledger and wizard, then assembles and
/// persists one record per selected date.
pub struct BookingController {
    wizard: WizardState,
    ledger: SlotLedger,
    companions: Vec<Option<Companion>>,
}

impl BookingController {
    pub fn new(wizard: WizardState) -> Self {
        Self {
            wizard,
            ledger: SlotLedger::new(1),
            companions: Vec::new(),
        }
    }

    pub fn wizard(&self) -> &WizardState {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut WizardState {
        &mut self.wizard
    }

    pub fn ledger(&self) -> &SlotLedger {
        &self.ledger
    }

    /// 報名者本人加上未移除的同行親友
    pub fn party_size(&self) -> u32 {
        1 + self.companions.iter().flatten().count() as u32
    }

    pub fn companions(&self) -> impl Iterator<Item = &Companion> {
        self.companions.iter().flatten()
    }

    /// Returns the companion's stable slot index; removal of a sibling never
    /// shifts it.
    pub fn add_companion(&mut self, companion: Companion) -> usize {
        self.companions.push(Some(companion));
        self.ledger.set_party_size(self.party_size());
        self.companions.len() - 1
    }

    /// Shrinks the party and re-clamps existing bookings; the returned events
    /// have already been applied to the wizard's bound fields.
    pub fn remove_companion(&mut self, index: usize) -> Vec<SlotEvent> {
        let Some(entry) = self.companions.get_mut(index) else {
            return Vec::new();
        };
        if entry.take().is_none() {
            return Vec::new();
        }
        let events = self.ledger.set_party_size(self.party_size());
        self.apply_events(&events);
        events
    }

    /// Pre-checks capacity before toggling, so the ledger is never asked to
    /// activate a slot that cannot fit.
    pub fn select_slot(&mut self, slot: &SlotKey) -> Result<Vec<SlotEvent>> {
        if !self.ledger.is_active(slot)
            && self
                .ledger
                .capacity_remaining(&slot.date, &slot.timeslot, Some(&slot.workshop))
                == 0
        {
            return Err(SignupError::CapacityExceeded {
                date: slot.date.clone(),
                timeslot: slot.timeslot.clone(),
            });
        }
        let events = self.ledger.toggle(slot)?;
        self.apply_events(&events);
        Ok(events)
    }

    pub fn add_headcount(&mut self, slot: &SlotKey) {
        let events = self.ledger.increment(slot);
        self.apply_events(&events);
        self.sync_field(slot);
    }

    pub fn remove_headcount(&mut self, slot: &SlotKey) {
        let events = self.ledger.decrement(slot);
        self.apply_events(&events);
        self.sync_field(slot);
    }

    /// Ledger events drive the form bindings: a deactivated slot loses its
    /// input field, a clamped one is rewritten with the new headcount.
    fn apply_events(&mut self, events: &[SlotEvent]) {
        for event in events {
            match event {
                SlotEvent::Activated(slot) => {
                    self.wizard.set_field(&slot.date, &slot.column_name(), json!(1));
                }
                SlotEvent::Deactivated(slot) => {
                    self.wizard.clear_field(&slot.date, &slot.column_name());
                }
                SlotEvent::Clamped { slot, headcount } => {
                    self.wizard
                        .set_field(&slot.date, &slot.column_name(), json!(headcount));
                }
            }
        }
    }

    fn sync_field(&mut self, slot: &SlotKey) {
        if self.ledger.is_active(slot) {
            self.wizard.set_field(
                &slot.date,
                &slot.column_name(),
                json!(self.ledger.headcount(slot)),
            );
        }
    }

    fn serialize_companions(&self) -> String {
        self.companions()
            .map(|companion| format!("{}({})", companion.name, companion.phone))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One record per selected date. The trailing check-in columns are written
    /// blank on purpose: they keep the sheet's header row stable between this
    /// append and the later check-in update.
    pub fn build_submission(
        &self,
        record_id: &str,
        registered_at: &str,
        attendee: &Attendee,
        dates: &[String],
    ) -> Vec<(String, RowRecord)> {
        dates
            .iter()
            .map(|date| {
                let mut record = RowRecord::new();
                record.set(columns::ID, record_id);
                record.set(columns::REGISTERED_AT, registered_at);
                record.set(columns::NAME, attendee.name.as_str());
                record.set(columns::PHONE, attendee.phone.as_str());
                record.set(columns::CONTACT_CHANNEL, attendee.contact_channel.as_str());
                record.set(columns::REFERRER, attendee.referrer.clone().unwrap_or_default());
                record.set(columns::COMPANIONS, self.serialize_companions());
                for (slot, headcount) in self.ledger.bookings_for_date(date) {
                    record.set(slot.column_name(), headcount);
                }
                record.set(columns::ATTENDED_AT, "");
                record.set(columns::HEALTH_DECLARED, "");
                (date.clone(), record)
            })
            .collect()
    }

    async fn persist_one(
        store: &dyn RegistrationStore,
        date_key: &str,
        record: &RowRecord,
    ) -> Result<String> {
        if store.load_header(date_key).await?.is_none() {
            let header: Vec<String> = record.columns().map(str::to_string).collect();
            store.init_header(date_key, &header).await?;
        }
        store.append_record(date_key, record).await
    }

    /// Persists every selected date (partial failure is visible, not fatal),
    /// then best-effort uploads the QR badge and sends the confirmation.
    pub async fn submit(
        &mut self,
        services: &BookingServices<'_>,
        attendee: &Attendee,
        dates: &[String],
        notify_to: Option<&str>,
    ) -> Result<SubmissionOutcome> {
        if !self.wizard.begin_submit() {
            return Err(SignupError::SubmitInFlight);
        }

        let record_id = nanoid!();
        let registered_at = locale_timestamp(Local::now());
        let records = self.build_submission(&record_id, &registered_at, attendee, dates);

        let mut persisted = Vec::new();
        let mut failed = Vec::new();
        for (date_key, record) in &records {
            match Self::persist_one(services.store, date_key, record).await {
                Ok(row_id) => {
                    tracing::info!("✅ persisted {date_key} (row {row_id})");
                    persisted.push(date_key.clone());
                }
                Err(e) => {
                    tracing::error!("❌ persistence failed for {date_key}: {e}");
                    failed.push((date_key.clone(), e.to_string()));
                }
            }
        }

        if persisted.is_empty() {
            let reason = failed
                .iter()
                .map(|(date_key, message)| format!("{date_key}: {message}"))
                .collect::<Vec<_>>()
                .join("; ");
            self.wizard.finish_submit(Err(reason));
            return Ok(SubmissionOutcome {
                record_id,
                persisted,
                failed,
                badge_url: None,
                notified: false,
            });
        }

        let badge_url = self.upload_badge(services, &record_id).await;

        let mut notified = false;
        if let Some(to) = notify_to {
            let template_data = json!({
                "id": record_id,
                "name": attendee.name,
                "badge_url": badge_url,
            });
            match services.notifier.send(to, &template_data).await {
                Ok(()) => notified = true,
                Err(e) => tracing::warn!("notification failed, registration stands: {e}"),
            }
        }

        self.wizard.finish_submit(Ok(()));
        Ok(SubmissionOutcome {
            record_id,
            persisted,
            failed,
            badge_url,
            notified,
        })
    }

    async fn upload_badge(&self, services: &BookingServices<'_>, record_id: &str) -> Option<String> {
        let blob = match services.qr.render(record_id) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("QR render failed, confirmation goes out without a badge: {e}");
                return None;
            }
        };
        let key = format!("{}{}.png", services.badge_prefix, record_id);
        match services.assets.upload(&blob, &key).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("badge upload failed: {e}");
                None
            }
        }
    }
}
