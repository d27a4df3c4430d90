//! Wall-clock source for commands that default to "now"
//!
//! # Mock Time for Development
//!
//! In debug builds, the `FEEGRANT_MOCK_TIME` environment variable overrides
//! the current time. Mock time advances from the given instant at the same
//! rate as real time.
//!
//! Format: `YYYY-MM-DD HH:MM:SS`, interpreted as UTC (e.g. `2026-01-01 00:00:00`)
//!
//! Example:
//! ```bash
//! FEEGRANT_MOCK_TIME="2026-01-01 00:00:00" feegrantctl check --height 1200
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "FEEGRANT_MOCK_TIME";

/// Expected format of [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, fixed at first use
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

/// Parse a mock time string as UTC
pub fn parse_mock_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, MOCK_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_mock_time(&mock_time_str) {
                    Some(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(Utc::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Current UTC time, respecting mock time in debug builds.
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}
