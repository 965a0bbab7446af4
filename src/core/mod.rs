pub mod booking;
pub mod checkin;
pub mod ledger;
pub mod wizard;

pub use crate::domain::model::{Attendee, Companion, RowRecord, SlotKey, SubmissionOutcome};
pub use crate::domain::ports::{AssetStore, CheckInStore, Notifier, QrRenderer, RegistrationStore};
pub use crate::utils::error::Result;
