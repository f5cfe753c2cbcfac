//! Shared plumbing for the back-office crates: logging setup, environment
//! helpers and small response types used by more than one crate.

pub mod env;
pub mod types;
pub mod utils;
