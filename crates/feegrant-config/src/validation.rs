//! Configuration validation

use crate::schema::{RawConfig, RawExpiresAt, RawGrant, RawPeriod};
use chrono::{DateTime, Utc};
use feegrant_expiry::{ExpiresAt, ExpiresAtRecord, Period, PeriodRecord};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Grant '{grant_id}': {message}")]
    GrantError { grant_id: String, message: String },

    #[error("Duplicate grant ID: {0}")]
    DuplicateGrantId(String),

    #[error("Grant ID cannot be empty")]
    EmptyGrantId,

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Grant '{grant_id}': period {period} cannot advance expiration {expires_at}")]
    IncompatiblePeriod {
        grant_id: String,
        expires_at: ExpiresAt,
        period: Period,
    },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Check for duplicate grant IDs
    let mut seen_ids = HashSet::new();
    for grant in &config.grants {
        if !seen_ids.insert(&grant.id) {
            errors.push(ValidationError::DuplicateGrantId(grant.id.clone()));
        }
    }

    for grant in &config.grants {
        errors.extend(validate_grant(grant));
    }

    errors
}

fn validate_grant(grant: &RawGrant) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if grant.id.trim().is_empty() {
        errors.push(ValidationError::EmptyGrantId);
    }

    let expires_at = match &grant.expires_at {
        Some(raw) => match parse_expires_at(raw) {
            Ok(expires_at) => Some(expires_at),
            Err(e) => {
                errors.push(e.for_grant(&grant.id));
                None
            }
        },
        None => Some(ExpiresAt::Never),
    };

    let period = match &grant.period {
        Some(raw) => match parse_period(raw) {
            Ok(period) => Some(period),
            Err(e) => {
                errors.push(e.for_grant(&grant.id));
                None
            }
        },
        None => None,
    };

    // Only check units once both sides parsed
    if let (Some(expires_at), Some(period)) = (expires_at, period)
        && !expires_at.is_compatible(&period)
    {
        errors.push(ValidationError::IncompatiblePeriod {
            grant_id: grant.id.clone(),
            expires_at,
            period,
        });
    }

    errors
}

/// Failure to parse one field of a grant
#[derive(Debug, Clone)]
pub enum FieldError {
    Time { value: String, message: String },
    Invalid(String),
}

impl FieldError {
    fn for_grant(self, grant_id: &str) -> ValidationError {
        match self {
            Self::Time { value, message } => ValidationError::InvalidTimeFormat { value, message },
            Self::Invalid(message) => ValidationError::GrantError {
                grant_id: grant_id.to_string(),
                message,
            },
        }
    }
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Expected RFC 3339 timestamp: {}", e))
}

/// Parse an expiration. An empty table means never.
pub fn parse_expires_at(raw: &RawExpiresAt) -> Result<ExpiresAt, FieldError> {
    let time = raw
        .time
        .as_deref()
        .map(|s| {
            parse_instant(s).map_err(|message| FieldError::Time {
                value: s.to_string(),
                message,
            })
        })
        .transpose()?;

    let record = ExpiresAtRecord {
        time,
        height: raw.height.unwrap_or(0),
    };

    let expires_at =
        ExpiresAt::try_from(record).map_err(|e| FieldError::Invalid(format!("expires_at: {}", e)))?;
    expires_at
        .validate_basic()
        .map_err(|e| FieldError::Invalid(format!("expires_at: {}", e)))?;
    Ok(expires_at)
}

/// Parse a reset period
pub fn parse_period(raw: &RawPeriod) -> Result<Period, FieldError> {
    let clock = raw
        .clock_seconds
        .unwrap_or(0)
        .checked_mul(1_000_000_000)
        .ok_or_else(|| FieldError::Invalid("period: clock_seconds is too large".into()))?;

    let record = PeriodRecord {
        clock,
        block: raw.blocks.unwrap_or(0),
    };

    let period =
        Period::try_from(record).map_err(|e| FieldError::Invalid(format!("period: {}", e)))?;
    period
        .validate_basic()
        .map_err(|e| FieldError::Invalid(format!("period: {}", e)))?;
    Ok(period)
}
