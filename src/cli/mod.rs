//! Command-line interface for dsa-coder.
//!
//! Provides commands for serving the web form, generating and debugging
//! solutions from the terminal, and listing supported languages.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
