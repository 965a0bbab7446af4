pub mod cli;

use crate::domain::model::{Attendee, Companion};
use crate::utils::error::{Result, SignupError};
use crate::utils::validation::{
    validate_non_empty_string, validate_phone, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub event: EventInfo,
    pub services: ServicesConfig,
    pub days: Vec<DayConfig>,
    pub workshops: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInfo {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub sheet_api: String,
    pub notify_api: String,
    pub asset_api: String,
    /// Key prefix for uploaded QR badges, e.g. `badges/`.
    #[serde(default)]
    pub badge_prefix: String,
}

/// 每個活動日對應一張工作表；sheet 是後端試算表的 gid。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConfig {
    pub key: String,
    pub label: String,
    pub sheet: String,
    pub timeslots: Vec<String>,
}

impl EventConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EventConfig = toml::from_str(&text)?;
        Ok(config)
    }

    pub fn day(&self, key: &str) -> Option<&DayConfig> {
        self.days.iter().find(|day| day.key == key)
    }

    pub fn date_keys(&self) -> Vec<String> {
        self.days.iter().map(|day| day.key.clone()).collect()
    }
}

impl Validate for EventConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("event.name", &self.event.name)?;
        validate_url("services.sheet_api", &self.services.sheet_api)?;
        validate_url("services.notify_api", &self.services.notify_api)?;
        validate_url("services.asset_api", &self.services.asset_api)?;

        if self.days.is_empty() {
            return Err(SignupError::MissingConfigError {
                field: "days".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for day in &self.days {
            validate_non_empty_string("days.key", &day.key)?;
            validate_non_empty_string("days.label", &day.label)?;
            validate_non_empty_string("days.sheet", &day.sheet)?;
            if day.timeslots.is_empty() {
                return Err(SignupError::MissingConfigError {
                    field: format!("days.{}.timeslots", day.key),
                });
            }
            if !seen.insert(day.key.as_str()) {
                return Err(SignupError::InvalidConfigValueError {
                    field: "days.key".to_string(),
                    value: day.key.clone(),
                    reason: "Duplicate day key".to_string(),
                });
            }
        }

        if self.workshops.is_empty() {
            return Err(SignupError::MissingConfigError {
                field: "workshops".to_string(),
            });
        }
        Ok(())
    }
}

/// One registration, as fed to the `register` subcommand from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionInput {
    pub attendee: Attendee,
    #[serde(default)]
    pub companions: Vec<Companion>,
    pub dates: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bookings: Vec<BookingInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    pub date: String,
    pub timeslot: String,
    pub workshop: String,
    #[serde(default = "default_headcount")]
    pub headcount: u32,
}

fn default_headcount() -> u32 {
    1
}

impl SubmissionInput {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let input: SubmissionInput = toml::from_str(&text)?;
        Ok(input)
    }

    /// Cross-checks the submission against the event: unknown dates or
    /// workshops are configuration mistakes, not user typos to forgive.
    pub fn validate_against(&self, config: &EventConfig) -> Result<()> {
        self.validate()?;
        for date in &self.dates {
            if config.day(date).is_none() {
                return Err(SignupError::InvalidConfigValueError {
                    field: "dates".to_string(),
                    value: date.clone(),
                    reason: "Not an event day".to_string(),
                });
            }
        }
        for booking in &self.bookings {
            let Some(day) = config.day(&booking.date) else {
                return Err(SignupError::InvalidConfigValueError {
                    field: "bookings.date".to_string(),
                    value: booking.date.clone(),
                    reason: "Not an event day".to_string(),
                });
            };
            if !self.dates.contains(&booking.date) {
                return Err(SignupError::InvalidConfigValueError {
                    field: "bookings.date".to_string(),
                    value: booking.date.clone(),
                    reason: "Booking on a date that was not selected".to_string(),
                });
            }
            if !day.timeslots.contains(&booking.timeslot) {
                return Err(SignupError::InvalidConfigValueError {
                    field: "bookings.timeslot".to_string(),
                    value: booking.timeslot.clone(),
                    reason: format!("Unknown timeslot on {}", booking.date),
                });
            }
            if !config.workshops.contains(&booking.workshop) {
                return Err(SignupError::InvalidConfigValueError {
                    field: "bookings.workshop".to_string(),
                    value: booking.workshop.clone(),
                    reason: "Unknown workshop".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Validate for SubmissionInput {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("attendee.name", &self.attendee.name)?;
        validate_phone("attendee.phone", &self.attendee.phone)?;
        validate_non_empty_string("attendee.contact_channel", &self.attendee.contact_channel)?;
        for companion in &self.companions {
            validate_non_empty_string("companions.name", &companion.name)?;
            validate_phone("companions.phone", &companion.phone)?;
        }
        if self.dates.is_empty() {
            return Err(SignupError::Validation {
                fields: vec!["dates".to_string()],
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
workshops = ["Craft", "Baking", "Choir"]

[event]
name = "聖誕園遊會"

[services]
sheet_api = "https://sheets.example.com"
notify_api = "https://mail.example.com/send"
asset_api = "https://assets.example.com"
badge_prefix = "badges/"

[[days]]
key = "day1"
label = "Day 1: 12月25日（六）"
sheet = "883456226"
timeslots = ["10:00", "11:00", "14:00"]

[[days]]
key = "day2"
label = "Day 2: 12月26日（日）"
sheet = "1241199622"
timeslots = ["10:00", "11:00"]
"#;

    fn sample_config() -> EventConfig {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn sample_config_parses_and_validates() {
        let config = sample_config();
        config.validate().unwrap();
        assert_eq!(config.date_keys(), vec!["day1", "day2"]);
        assert_eq!(config.day("day1").unwrap().sheet, "883456226");
        assert!(config.day("day3").is_none());
    }

    #[test]
    fn config_loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = EventConfig::from_path(file.path()).unwrap();
        assert_eq!(config.event.name, "聖誕園遊會");
    }

    #[test]
    fn duplicate_day_keys_are_rejected() {
        let mut config = sample_config();
        config.days[1].key = "day1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_timeslots_are_rejected() {
        let mut config = sample_config();
        config.days[0].timeslots.clear();
        assert!(config.validate().is_err());
    }

    fn sample_submission() -> SubmissionInput {
        toml::from_str(
            r#"
dates = ["day1"]
email = "winnie@example.com"

[attendee]
name = "Winnie"
phone = "91234567"
contact_channel = "email"

[[companions]]
name = "Piglet"
phone = "98765432"

[[bookings]]
date = "day1"
timeslot = "10:00"
workshop = "Craft"
headcount = 2
"#,
        )
        .unwrap()
    }

    #[test]
    fn submission_input_validates_against_the_event() {
        sample_submission().validate_against(&sample_config()).unwrap();
    }

    #[test]
    fn submission_with_unknown_workshop_is_rejected() {
        let mut input = sample_submission();
        input.bookings[0].workshop = "Skydiving".to_string();
        assert!(input.validate_against(&sample_config()).is_err());
    }

    #[test]
    fn submission_booking_on_unselected_date_is_rejected() {
        let mut input = sample_submission();
        input.dates = vec!["day2".to_string()];
        assert!(input.validate_against(&sample_config()).is_err());
    }

    #[test]
    fn submission_with_bad_phone_is_rejected() {
        let mut input = sample_submission();
        input.attendee.phone = "abc".to_string();
        assert!(input.validate_against(&sample_config()).is_err());
    }
}
