use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignupError {
    #[error("missing or invalid fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("no capacity left at {timeslot} on {date}")]
    CapacityExceeded { date: String, timeslot: String },

    #[error("persistence failed for {date_key}: {message}")]
    Persistence { date_key: String, message: String },

    #[error("no registration found for id {id}")]
    LookupNotFound { id: String },

    #[error("notification failed: {message}")]
    Notification { message: String },

    #[error("a submission is already in flight")]
    SubmitInFlight,

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SignupError>;
