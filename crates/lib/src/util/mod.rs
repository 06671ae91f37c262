//! Shared utilities.
//!
//! Digest verification for downloaded archives and the fixed YAML rendering
//! used for display.

pub mod hash;
pub mod yaml;

#[cfg(test)]
pub mod testutil;
