//! Operations behind each subcommand

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use feegrant_config::{ConfigError, GrantBook, GrantId, GrantSchedule};
use feegrant_expiry::{ExpiresAt, Period, Remaining};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Load a grant config, flattening validation failures into one message
pub fn load_book(path: &Path) -> Result<GrantBook> {
    let book = feegrant_config::load_config(path)
        .map_err(|e| anyhow!(describe_config_error(&e)))
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    info!(
        config_path = %path.display(),
        grant_count = book.grants.len(),
        "Configuration loaded"
    );
    Ok(book)
}

/// Human-readable description of a config error, one problem per line
pub fn describe_config_error(err: &ConfigError) -> String {
    match err {
        ConfigError::ValidationFailed { errors } => {
            let mut out = format!("Validation errors ({}):", errors.len());
            for e in errors {
                out.push_str(&format!("\n  - {}", e));
            }
            out
        }
        ConfigError::UnsupportedVersion(ver) => format!(
            "Unsupported config version: {} (expected {})",
            ver,
            feegrant_config::CURRENT_CONFIG_VERSION
        ),
        other => other.to_string(),
    }
}

/// A grant's expiration in its stored form, as printed by `step`, `export`
/// and `fast-forward`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantRecord {
    pub id: GrantId,
    pub expires_at: ExpiresAt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl GrantRecord {
    fn new(grant: &GrantSchedule, expires_at: ExpiresAt) -> Self {
        Self {
            id: grant.id.clone(),
            expires_at,
            period: grant.period,
        }
    }
}

/// Expiry state of one grant at a given time and height
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryState {
    Never,
    Active(Remaining),
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantStatus {
    pub id: GrantId,
    pub expires_at: ExpiresAt,
    pub state: ExpiryState,
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            ExpiryState::Never => write!(f, "{}: never expires", self.id),
            ExpiryState::Active(left) => {
                write!(f, "{}: active, expires at {} ({} left)", self.id, self.expires_at, left)
            }
            ExpiryState::Expired => write!(f, "{}: expired at {}", self.id, self.expires_at),
        }
    }
}

/// Expiry state of every grant
pub fn check_grants(book: &GrantBook, now: DateTime<Utc>, height: u64) -> Vec<GrantStatus> {
    book.grants
        .iter()
        .map(|grant| {
            let state = if grant.is_expired(now, height) {
                ExpiryState::Expired
            } else {
                match grant.expires_at.remaining(now, height) {
                    Some(left) => ExpiryState::Active(left),
                    None => ExpiryState::Never,
                }
            };
            debug!(grant = %grant.id, expires_at = %grant.expires_at, ?state, "Checked grant");
            GrantStatus {
                id: grant.id.clone(),
                expires_at: grant.expires_at,
                state,
            }
        })
        .collect()
}

/// Advance one grant's expiration by its period, `times` times
pub fn step_grant(book: &GrantBook, id: &GrantId, times: u32) -> Result<GrantRecord> {
    let grant = book
        .get_grant(id)
        .ok_or_else(|| anyhow!("Grant not found: {}", id))?;

    let expires_at = grant
        .advanced(times)
        .ok_or_else(|| anyhow!("Grant '{}' has no reset period", id))?
        .with_context(|| format!("Failed to step grant '{}'", id))?;

    info!(grant = %id, times, from = %grant.expires_at, to = %expires_at, "Stepped grant");
    Ok(GrantRecord::new(grant, expires_at))
}

/// Prepare every grant for export at the given dump time and height
pub fn export_grants(
    book: &GrantBook,
    dump_time: DateTime<Utc>,
    dump_height: u64,
) -> Result<Vec<GrantRecord>> {
    let records = book
        .grants
        .iter()
        .map(|grant| {
            let expires_at = grant
                .expires_at
                .prepare_for_export(dump_time, dump_height)
                .with_context(|| format!("Cannot export grant '{}'", grant.id))?;
            Ok(GrantRecord::new(grant, expires_at))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(grant_count = records.len(), dump_height, "Prepared grants for export");
    Ok(records)
}

/// Re-anchor every grant at the given time or height, keeping its unit.
/// Grants that never expire are left alone.
pub fn fast_forward_grants(book: &GrantBook, t: DateTime<Utc>, h: u64) -> Vec<GrantRecord> {
    book.grants
        .iter()
        .map(|grant| {
            let expires_at = if grant.expires_at.is_zero() {
                ExpiresAt::Never
            } else {
                grant.expires_at.fast_forward(t, h)
            };
            GrantRecord::new(grant, expires_at)
        })
        .collect()
}
