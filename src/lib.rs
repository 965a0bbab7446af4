pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{cli::Cli, EventConfig, SubmissionInput};
pub use crate::core::booking::{BookingController, BookingServices};
pub use crate::core::checkin::{CheckInFlow, CheckInState};
pub use crate::core::ledger::{SlotEvent, SlotLedger};
pub use crate::core::wizard::{WizardPage, WizardPhase, WizardState};
pub use crate::domain::model::{Attendee, Companion, RowRecord, SlotKey, SubmissionOutcome};
pub use crate::utils::error::{Result, SignupError};
