//! CLI command implementations for saia-pcd-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration and catalog validation
//! - `config`: Configuration file generation
//! - `test`: Collection passes against the live gateway

pub mod check;
pub mod config;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
