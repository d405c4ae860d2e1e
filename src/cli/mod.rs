//! CLI module
//!
//! Command-line interface for running exports.
//!
//! # Commands
//!
//! - `run` - Export the configured table to object storage
//! - `check` - Test the source connection and destination settings
//! - `tables` - List tables visible in the source database
//! - `invoke` - Run through the invocation wrapper and print its response

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
