//! feegrantctl - operator tooling for fee grant expirations
//!
//! Commands are plain functions over a loaded [`GrantBook`](feegrant_config::GrantBook)
//! so the binary stays a thin argument parser.

pub mod clock;
mod commands;

pub use commands::*;
