//! Shared utilities.
//!
//! Hashing helpers and test support.

pub mod hash;

#[cfg(test)]
pub mod testutil;
