//! Error types for grant expiration

use thiserror::Error;

/// Error returned by expiration and period operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryError {
    /// The expiration or period is malformed, or the two use different units
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

impl ExpiryError {
    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ExpiryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_duration_display() {
        let err = ExpiryError::invalid_duration("negative height");
        assert_eq!(err.to_string(), "invalid duration: negative height");
    }
}
