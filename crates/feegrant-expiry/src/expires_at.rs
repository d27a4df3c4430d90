//! Expiration points measured in block time or block height

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use crate::{format_instant, ExpiryError, Period, Result};

/// Highest storable expiration height
pub const MAX_HEIGHT: u64 = i64::MAX as u64;

/// A point where something expires.
///
/// It may be *either* a block time or a block height, or [`ExpiresAt::Never`]
/// for an expiration that is not set. Height zero cannot be represented: it
/// collapses to `Never`, so nothing can expire exactly at height 0.
///
/// Heights above [`MAX_HEIGHT`] do not fit the stored record and fail
/// [`validate_basic`](Self::validate_basic) and serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "ExpiresAtRecord")]
pub enum ExpiresAt {
    #[default]
    Never,
    AtTime(DateTime<Utc>),
    AtHeight(NonZeroU64),
}

impl ExpiresAt {
    /// Expiration at the given block time
    pub fn at_time(t: DateTime<Utc>) -> Self {
        Self::AtTime(t)
    }

    /// Expiration at the given block height. Height 0 means no expiration.
    pub fn at_height(h: u64) -> Self {
        NonZeroU64::new(h).map_or(Self::Never, Self::AtHeight)
    }

    /// Basic sanity checks. An unset expiration is allowed.
    ///
    /// Both-units-set and negative heights are rejected when a stored
    /// [`ExpiresAtRecord`] is converted; here only the height ceiling remains.
    pub fn validate_basic(&self) -> Result<()> {
        match self {
            Self::AtHeight(h) if h.get() > MAX_HEIGHT => {
                Err(ExpiryError::invalid_duration("height exceeds maximum"))
            }
            _ => Ok(()),
        }
    }

    /// True for an expiration that was never set
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Never)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::AtTime(t) => Some(*t),
            _ => None,
        }
    }

    pub fn height(&self) -> Option<u64> {
        match self {
            Self::AtHeight(h) => Some(h.get()),
            _ => None,
        }
    }

    /// Re-anchor at the given time or height, keeping whichever unit this
    /// expiration uses. An unset expiration is treated as height-based.
    pub fn fast_forward(&self, t: DateTime<Utc>, h: u64) -> Self {
        match self {
            Self::AtTime(_) => Self::at_time(t),
            Self::AtHeight(_) | Self::Never => Self::at_height(h),
        }
    }

    /// Whether the time or height is *equal to* or greater than the
    /// expiration point. An exact match counts as expired.
    ///
    /// An unset expiration never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, height: u64) -> bool {
        match self {
            Self::Never => false,
            Self::AtTime(t) => now >= *t,
            Self::AtHeight(h) => height >= h.get(),
        }
    }

    /// True iff the period uses the same unit as this expiration and is
    /// positive. Incompatible pairs cannot be stepped.
    ///
    /// An unset expiration is treated as height-based.
    pub fn is_compatible(&self, period: &Period) -> bool {
        match (self, period) {
            (Self::AtTime(_), Period::Clock(span)) => !span.is_zero(),
            (Self::AtHeight(_) | Self::Never, Period::Blocks(count)) => *count > 0,
            _ => false,
        }
    }

    /// Advance the expiration by one period
    pub fn step(&self, period: &Period) -> Result<Self> {
        if !self.is_compatible(period) {
            return Err(ExpiryError::invalid_duration(
                "expires_at and period have different units",
            ));
        }

        match (*self, *period) {
            (Self::AtTime(t), Period::Clock(span)) => chrono::Duration::from_std(span)
                .ok()
                .and_then(|delta| t.checked_add_signed(delta))
                .map(Self::AtTime)
                .ok_or_else(|| ExpiryError::invalid_duration("expiration time overflow")),
            (Self::AtHeight(h), Period::Blocks(count)) => h
                .checked_add(count)
                .filter(|next| next.get() <= MAX_HEIGHT)
                .map(Self::AtHeight)
                .ok_or_else(|| ExpiryError::invalid_duration("expiration height overflow")),
            (Self::Never, Period::Blocks(count)) if count <= MAX_HEIGHT => {
                Ok(Self::at_height(count))
            }
            (Self::Never, Period::Blocks(_)) => {
                Err(ExpiryError::invalid_duration("expiration height overflow"))
            }
            _ => Err(ExpiryError::invalid_duration(
                "expires_at and period have different units",
            )),
        }
    }

    /// Like [`step`](Self::step), but panics on error.
    ///
    /// Only for callers that already checked [`is_compatible`](Self::is_compatible):
    /// a failure here is a programming error, not a rejected input.
    pub fn must_step(&self, period: &Period) -> Self {
        match self.step(period) {
            Ok(next) => next,
            Err(err) => {
                tracing::error!(expires_at = %self, period = %period, "Cannot step expiration");
                panic!("{err}")
            }
        }
    }

    /// Deduct the dump height from a height-based expiration so that, once
    /// reloaded on a chain restarting at height zero, the number of blocks
    /// left is unchanged. Time-based and unset expirations pass through.
    ///
    /// Fails if the expiration is already reached at `dump_height`, since
    /// the adjusted height would otherwise read as unset.
    pub fn prepare_for_export(&self, _dump_time: DateTime<Utc>, dump_height: u64) -> Result<Self> {
        match self {
            Self::AtHeight(h) => h
                .get()
                .checked_sub(dump_height)
                .and_then(NonZeroU64::new)
                .map(Self::AtHeight)
                .ok_or_else(|| {
                    ExpiryError::invalid_duration("expiration height precedes export height")
                }),
            Self::AtTime(_) | Self::Never => Ok(*self),
        }
    }

    /// Time or blocks left before expiry, zero once expired. `None` when unset.
    pub fn remaining(&self, now: DateTime<Utc>, height: u64) -> Option<Remaining> {
        match self {
            Self::Never => None,
            Self::AtTime(t) => Some(Remaining::Time(
                t.signed_duration_since(now).to_std().unwrap_or(Duration::ZERO),
            )),
            Self::AtHeight(h) => Some(Remaining::Blocks(h.get().saturating_sub(height))),
        }
    }
}

impl fmt::Display for ExpiresAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::AtTime(t) => write!(f, "time {}", format_instant(t)),
            Self::AtHeight(h) => write!(f, "height {}", h),
        }
    }
}

/// What is left of an expiration, in its own unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Time(Duration),
    Blocks(u64),
}

impl Remaining {
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Time(d) => d.is_zero(),
            Self::Blocks(n) => *n == 0,
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time(d) => write!(f, "{}", crate::format_span(*d)),
            Self::Blocks(1) => write!(f, "1 block"),
            Self::Blocks(n) => write!(f, "{} blocks", n),
        }
    }
}

/// Two-field stored form of an [`ExpiresAt`].
///
/// A missing time and a zero height together mean "never expires".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiresAtRecord {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub height: i64,
}

impl TryFrom<ExpiresAt> for ExpiresAtRecord {
    type Error = ExpiryError;

    fn try_from(expires_at: ExpiresAt) -> Result<Self> {
        match expires_at {
            ExpiresAt::Never => Ok(Self::default()),
            ExpiresAt::AtTime(t) => Ok(Self {
                time: Some(t),
                height: 0,
            }),
            ExpiresAt::AtHeight(h) => i64::try_from(h.get())
                .map(|height| Self { time: None, height })
                .map_err(|_| ExpiryError::invalid_duration("height exceeds maximum")),
        }
    }
}

impl Serialize for ExpiresAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ExpiresAtRecord::try_from(*self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl TryFrom<ExpiresAtRecord> for ExpiresAt {
    type Error = ExpiryError;

    fn try_from(record: ExpiresAtRecord) -> Result<Self> {
        if record.time.is_some() && record.height != 0 {
            return Err(ExpiryError::invalid_duration("both time and height are set"));
        }
        if record.height < 0 {
            return Err(ExpiryError::invalid_duration("negative height"));
        }

        match record.time {
            Some(t) => Ok(Self::at_time(t)),
            None => Ok(Self::at_height(record.height as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn unset_is_zero_and_valid() {
        let unset = ExpiresAt::default();
        assert!(unset.is_zero());
        assert!(unset.validate_basic().is_ok());
        assert_eq!(unset.time(), None);
        assert_eq!(unset.height(), None);
    }

    #[test]
    fn constructors_are_valid() {
        assert!(ExpiresAt::at_time(base_time()).validate_basic().is_ok());
        for h in [0, 1, 500, MAX_HEIGHT] {
            assert!(ExpiresAt::at_height(h).validate_basic().is_ok());
        }
        assert!(ExpiresAt::at_height(MAX_HEIGHT + 1).validate_basic().is_err());
    }

    #[test]
    fn height_zero_is_unset() {
        assert_eq!(ExpiresAt::at_height(0), ExpiresAt::Never);
        assert!(ExpiresAt::at_height(0).is_zero());
        assert!(!ExpiresAt::at_height(1).is_zero());
        assert!(!ExpiresAt::at_time(base_time()).is_zero());
    }

    #[test]
    fn unset_never_expires() {
        let unset = ExpiresAt::Never;
        let far_future = Utc.with_ymd_and_hms(9999, 1, 1, 0, 0, 0).unwrap();
        assert!(!unset.is_expired(base_time(), 0));
        assert!(!unset.is_expired(far_future, u64::MAX));
    }

    #[test]
    fn time_expiry_is_inclusive() {
        let t = base_time();
        let expires = ExpiresAt::at_time(t);

        assert!(!expires.is_expired(t - chrono::Duration::nanoseconds(1), 0));
        assert!(expires.is_expired(t, 0));
        assert!(expires.is_expired(t + chrono::Duration::seconds(1), 0));

        // Height is ignored for a time-based expiration
        assert!(!expires.is_expired(t - chrono::Duration::seconds(1), u64::MAX));
    }

    #[test]
    fn height_expiry_is_inclusive() {
        let expires = ExpiresAt::at_height(100);
        let t = base_time();

        assert!(!expires.is_expired(t, 99));
        assert!(expires.is_expired(t, 100));
        assert!(expires.is_expired(t, 101));
    }

    #[test]
    fn compatibility_matches_units() {
        let by_time = ExpiresAt::at_time(base_time());
        let by_height = ExpiresAt::at_height(10);
        let clock = Period::clock(Duration::from_secs(60));
        let blocks = Period::blocks(5);

        assert!(by_time.is_compatible(&clock));
        assert!(!by_time.is_compatible(&blocks));
        assert!(by_height.is_compatible(&blocks));
        assert!(!by_height.is_compatible(&clock));

        // Zero periods are never compatible
        assert!(!by_time.is_compatible(&Period::clock(Duration::ZERO)));
        assert!(!by_height.is_compatible(&Period::blocks(0)));

        // Unset counts as height-based
        assert!(ExpiresAt::Never.is_compatible(&blocks));
        assert!(!ExpiresAt::Never.is_compatible(&clock));
    }

    #[test]
    fn step_time() {
        let expires = ExpiresAt::at_time(base_time());
        let next = expires.step(&Period::clock(Duration::from_secs(3600))).unwrap();
        assert_eq!(next, ExpiresAt::at_time(base_time() + chrono::Duration::hours(1)));
        assert_eq!(next.height(), None);
    }

    #[test]
    fn step_height() {
        let expires = ExpiresAt::at_height(100);
        let next = expires.step(&Period::blocks(25)).unwrap();
        assert_eq!(next, ExpiresAt::at_height(125));
        assert_eq!(next.time(), None);
    }

    #[test]
    fn step_unset_with_blocks() {
        let next = ExpiresAt::Never.step(&Period::blocks(7)).unwrap();
        assert_eq!(next, ExpiresAt::at_height(7));
    }

    #[test]
    fn step_fails_exactly_when_incompatible() {
        let points = [
            ExpiresAt::Never,
            ExpiresAt::at_time(base_time()),
            ExpiresAt::at_height(42),
        ];
        let periods = [
            Period::clock(Duration::ZERO),
            Period::clock(Duration::from_secs(1)),
            Period::blocks(0),
            Period::blocks(3),
        ];

        for point in &points {
            for period in &periods {
                let result = point.step(period);
                assert_eq!(
                    result.is_ok(),
                    point.is_compatible(period),
                    "{point} stepped by {period:?}"
                );
                if let Err(err) = result {
                    assert!(matches!(err, ExpiryError::InvalidDuration(_)));
                }
            }
        }
    }

    #[test]
    fn step_height_overflow() {
        let expires = ExpiresAt::at_height(u64::MAX);
        assert!(matches!(
            expires.step(&Period::blocks(1)),
            Err(ExpiryError::InvalidDuration(_))
        ));
    }

    #[test]
    fn must_step_advances() {
        let expires = ExpiresAt::at_height(10);
        assert_eq!(expires.must_step(&Period::blocks(5)), ExpiresAt::at_height(15));
    }

    #[test]
    #[should_panic(expected = "different units")]
    fn must_step_panics_on_mismatch() {
        let expires = ExpiresAt::at_time(base_time());
        expires.must_step(&Period::blocks(5));
    }

    #[test]
    fn fast_forward_keeps_unit() {
        let t = base_time();
        let later = t + chrono::Duration::days(2);

        let by_time = ExpiresAt::at_time(t).fast_forward(later, 999);
        assert_eq!(by_time, ExpiresAt::at_time(later));
        assert_eq!(by_time.height(), None);

        let by_height = ExpiresAt::at_height(50).fast_forward(later, 999);
        assert_eq!(by_height, ExpiresAt::at_height(999));
        assert_eq!(by_height.time(), None);

        assert_eq!(ExpiresAt::Never.fast_forward(later, 12), ExpiresAt::at_height(12));
    }

    #[test]
    fn prepare_for_export_deducts_height() {
        let exported = ExpiresAt::at_height(100)
            .prepare_for_export(base_time(), 30)
            .unwrap();
        assert_eq!(exported, ExpiresAt::at_height(70));
    }

    #[test]
    fn prepare_for_export_passes_time_through() {
        let expires = ExpiresAt::at_time(base_time());
        let dump_time = base_time() + chrono::Duration::days(30);
        assert_eq!(expires.prepare_for_export(dump_time, 5000).unwrap(), expires);
        assert_eq!(
            ExpiresAt::Never.prepare_for_export(dump_time, 5000).unwrap(),
            ExpiresAt::Never
        );
    }

    #[test]
    fn prepare_for_export_rejects_reached_height() {
        let expires = ExpiresAt::at_height(100);
        assert!(expires.prepare_for_export(base_time(), 100).is_err());
        assert!(expires.prepare_for_export(base_time(), 150).is_err());
    }

    #[test]
    fn remaining_in_own_unit() {
        let t = base_time();
        let by_time = ExpiresAt::at_time(t + chrono::Duration::seconds(90));
        assert_eq!(
            by_time.remaining(t, 0),
            Some(Remaining::Time(Duration::from_secs(90)))
        );
        assert_eq!(
            by_time.remaining(t + chrono::Duration::hours(1), 0),
            Some(Remaining::Time(Duration::ZERO))
        );

        let by_height = ExpiresAt::at_height(100);
        assert_eq!(by_height.remaining(t, 40), Some(Remaining::Blocks(60)));
        assert!(by_height.remaining(t, 120).unwrap().is_zero());

        assert_eq!(ExpiresAt::Never.remaining(t, 0), None);
    }

    #[test]
    fn record_rejects_both_set() {
        let record = ExpiresAtRecord {
            time: Some(base_time()),
            height: 10,
        };
        let err = ExpiresAt::try_from(record).unwrap_err();
        assert_eq!(err, ExpiryError::invalid_duration("both time and height are set"));
    }

    #[test]
    fn record_rejects_negative_height() {
        let record = ExpiresAtRecord {
            time: None,
            height: -1,
        };
        let err = ExpiresAt::try_from(record).unwrap_err();
        assert_eq!(err, ExpiryError::invalid_duration("negative height"));
    }

    #[test]
    fn json_round_trip_is_exact() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);

        for expires in [ExpiresAt::Never, ExpiresAt::at_time(t), ExpiresAt::at_height(77)] {
            let json = serde_json::to_string(&expires).unwrap();
            let parsed: ExpiresAt = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, expires, "round trip through {json}");
        }

        let json = serde_json::to_string(&ExpiresAt::Never).unwrap();
        assert_eq!(json, r#"{"time":null,"height":0}"#);
    }

    #[test]
    fn step_stops_at_max_height() {
        let top = ExpiresAt::at_height(MAX_HEIGHT - 5);
        let stepped = top.step(&Period::blocks(5)).unwrap();
        assert_eq!(stepped.height(), Some(MAX_HEIGHT));

        let json = serde_json::to_string(&stepped).unwrap();
        let back: ExpiresAt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stepped);

        assert_eq!(
            stepped.step(&Period::blocks(5)).unwrap_err(),
            ExpiryError::invalid_duration("expiration height overflow")
        );
        assert!(ExpiresAt::Never.step(&Period::blocks(MAX_HEIGHT + 1)).is_err());
    }

    #[test]
    fn serialize_rejects_heights_above_max() {
        let too_high = ExpiresAt::at_height(MAX_HEIGHT + 1);
        assert!(serde_json::to_string(&too_high).is_err());
        assert!(ExpiresAtRecord::try_from(too_high).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(ExpiresAt::Never.to_string(), "never");
        assert_eq!(ExpiresAt::at_height(5).to_string(), "height 5");
        assert_eq!(
            ExpiresAt::at_time(base_time()).to_string(),
            "time 2026-03-01T12:00:00Z"
        );
    }
}
