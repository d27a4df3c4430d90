//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Grant expiry definitions
    #[serde(default)]
    pub grants: Vec<RawGrant>,
}

/// Raw grant definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawGrant {
    /// Unique stable ID
    pub id: String,

    /// Free-form note shown by tooling
    pub note: Option<String>,

    /// When the grant expires. Absent means never.
    #[serde(default)]
    pub expires_at: Option<RawExpiresAt>,

    /// Periodic reset interval
    #[serde(default)]
    pub period: Option<RawPeriod>,
}

/// Expiration point: at most one of `time` and `height`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawExpiresAt {
    /// RFC 3339 timestamp, e.g. "2026-01-01T00:00:00Z"
    pub time: Option<String>,

    /// Block height
    pub height: Option<i64>,
}

/// Reset period: exactly one of `clock_seconds` and `blocks`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPeriod {
    /// Wall-clock span in seconds
    pub clock_seconds: Option<i64>,

    /// Number of blocks
    pub blocks: Option<i64>,
}
