//! Surface water network CLI library.
//!
//! Command handlers and output formatting used by the `swn-cli` binary.

pub mod commands;
pub mod output;
