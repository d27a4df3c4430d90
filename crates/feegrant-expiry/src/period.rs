//! Repeating increments used to advance an expiration

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::{format_span, ExpiryError, Result};

/// Longest storable clock period: `i64::MAX` nanoseconds, about 292 years
pub const MAX_CLOCK_SPAN: Duration = Duration::from_nanos(i64::MAX as u64);

/// Largest storable block period
pub const MAX_BLOCKS: u64 = i64::MAX as u64;

/// A repeating unit of either clock time or number of blocks.
///
/// Added to an [`ExpiresAt`](crate::ExpiresAt) of the same unit by
/// [`ExpiresAt::step`](crate::ExpiresAt::step). Only one unit can be active;
/// whether that unit is positive and storable is checked by
/// [`Period::validate_basic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "PeriodRecord")]
pub enum Period {
    /// Wall-clock span
    Clock(Duration),
    /// Number of blocks
    Blocks(u64),
}

impl Period {
    pub fn clock(span: Duration) -> Self {
        Self::Clock(span)
    }

    pub fn blocks(count: u64) -> Self {
        Self::Blocks(count)
    }

    /// Exactly one unit must be set, positive, and within the stored range
    pub fn validate_basic(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ExpiryError::invalid_duration(
                "neither time and height are set",
            ));
        }
        PeriodRecord::try_from(*self).map(|_| ())
    }

    /// Returns the clock span when this is a clock period
    pub fn clock_span(&self) -> Option<Duration> {
        match self {
            Self::Clock(span) => Some(*span),
            Self::Blocks(_) => None,
        }
    }

    /// Returns the block count when this is a block period
    pub fn block_count(&self) -> Option<u64> {
        match self {
            Self::Clock(_) => None,
            Self::Blocks(count) => Some(*count),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Clock(span) => span.is_zero(),
            Self::Blocks(count) => *count == 0,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(span) => write!(f, "{}", format_span(*span)),
            Self::Blocks(1) => write!(f, "1 block"),
            Self::Blocks(count) => write!(f, "{} blocks", count),
        }
    }
}

/// Two-field stored form of a [`Period`]: clock span in nanoseconds and block count.
///
/// Zero means unset for both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    #[serde(default)]
    pub clock: i64,
    #[serde(default)]
    pub block: i64,
}

impl TryFrom<Period> for PeriodRecord {
    type Error = ExpiryError;

    fn try_from(period: Period) -> Result<Self> {
        match period {
            Period::Clock(span) => i64::try_from(span.as_nanos())
                .map(|clock| Self { clock, block: 0 })
                .map_err(|_| ExpiryError::invalid_duration("clock step exceeds maximum")),
            Period::Blocks(count) => i64::try_from(count)
                .map(|block| Self { clock: 0, block })
                .map_err(|_| ExpiryError::invalid_duration("block step exceeds maximum")),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PeriodRecord::try_from(*self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl TryFrom<PeriodRecord> for Period {
    type Error = ExpiryError;

    fn try_from(record: PeriodRecord) -> Result<Self> {
        if record.block == 0 && record.clock == 0 {
            return Err(ExpiryError::invalid_duration(
                "neither time and height are set",
            ));
        }
        if record.block != 0 && record.clock != 0 {
            return Err(ExpiryError::invalid_duration("both time and height are set"));
        }
        if record.block < 0 {
            return Err(ExpiryError::invalid_duration("negative block step"));
        }
        if record.clock < 0 {
            return Err(ExpiryError::invalid_duration("negative clock step"));
        }

        if record.clock != 0 {
            Ok(Self::Clock(Duration::from_nanos(record.clock as u64)))
        } else {
            Ok(Self::Blocks(record.block as u64))
        }
    }
}
