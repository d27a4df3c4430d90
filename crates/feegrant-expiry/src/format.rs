//! Human-readable rendering for spans and instants

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Format a span in human-readable form
///
/// Sub-second remainders are dropped unless the span is shorter than a second,
/// in which case the largest whole unit of ms, µs or ns is used.
pub fn format_span(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if seconds > 0 || d.is_zero() {
        format!("{}s", seconds)
    } else if d.as_millis() > 0 {
        format!("{}ms", d.as_millis())
    } else if d.as_micros() > 0 {
        format!("{}µs", d.as_micros())
    } else {
        format!("{}ns", d.as_nanos())
    }
}

/// Format an instant as RFC 3339 in UTC, keeping sub-second precision only when present
pub fn format_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
