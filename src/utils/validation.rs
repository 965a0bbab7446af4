use crate::utils::error::{Result, SignupError};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SignupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SignupError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SignupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SignupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("valid phone pattern"))
}

/// 電話格式：可帶 + 字首的 8 至 15 位數字
pub fn validate_phone(field_name: &str, value: &str) -> Result<()> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if phone_pattern().is_match(&digits) {
        Ok(())
    } else {
        Err(SignupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Not a valid phone number".to_string(),
        })
    }
}

const RECORD_ID_LEN: usize = 21;

/// Scanned QR payloads arrive as free text; reject anything that is not a
/// well-formed record id before we touch the remote store.
pub fn validate_record_id(candidate: &str) -> Result<String> {
    let trimmed = candidate.trim();
    let well_formed = trimmed.len() == RECORD_ID_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if well_formed {
        Ok(trimmed.to_string())
    } else {
        Err(SignupError::Validation {
            fields: vec!["id".to_string()],
        })
    }
}
