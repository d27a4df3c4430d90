//! Time-or-height expiration for fee grants
//!
//! This crate provides:
//! - `ExpiresAt`: an expiration point in block time or block height
//! - `Period`: a repeating clock or block increment for periodic resets
//! - The two-field stored records for both
//! - Error types
//!
//! Current time and height are always passed in by the caller.

mod error;
mod expires_at;
mod format;
mod period;

pub use error::*;
pub use expires_at::*;
pub use format::*;
pub use period::*;
