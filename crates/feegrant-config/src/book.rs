//! Validated grant definitions

use crate::schema::{RawConfig, RawGrant};
use crate::validation::{parse_expires_at, parse_period};
use chrono::{DateTime, Utc};
use feegrant_expiry::{ExpiresAt, Period};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a grant in the config
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantId(String);

impl GrantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GrantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Validated set of grants ready for use by tooling
#[derive(Debug, Clone, Default)]
pub struct GrantBook {
    pub grants: Vec<GrantSchedule>,
}

impl GrantBook {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            grants: raw.grants.into_iter().map(GrantSchedule::from_raw).collect(),
        }
    }

    /// Get grant by ID
    pub fn get_grant(&self, id: &GrantId) -> Option<&GrantSchedule> {
        self.grants.iter().find(|g| &g.id == id)
    }
}

/// Expiry and reset schedule of one grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSchedule {
    pub id: GrantId,
    pub note: Option<String>,
    pub expires_at: ExpiresAt,
    /// None means the grant is never renewed
    pub period: Option<Period>,
}

impl GrantSchedule {
    fn from_raw(raw: RawGrant) -> Self {
        // Validation has already rejected anything that fails to parse
        let expires_at = raw
            .expires_at
            .as_ref()
            .and_then(|e| parse_expires_at(e).ok())
            .unwrap_or_default();
        let period = raw.period.as_ref().and_then(|p| parse_period(p).ok());

        Self {
            id: GrantId::new(raw.id),
            note: raw.note,
            expires_at,
            period,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, height: u64) -> bool {
        self.expires_at.is_expired(now, height)
    }

    /// Expiration after `times` periodic resets.
    ///
    /// Returns `None` for a grant without a period.
    pub fn advanced(&self, times: u32) -> Option<feegrant_expiry::Result<ExpiresAt>> {
        let period = self.period?;
        let mut expires_at = self.expires_at;
        for _ in 0..times {
            expires_at = match expires_at.step(&period) {
                Ok(next) => next,
                Err(e) => return Some(Err(e)),
            };
        }
        Some(Ok(expires_at))
    }
}
