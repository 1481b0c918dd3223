//! Command-line interface for appforge.
//!
//! Provides commands for generating a project from a prompt and for
//! inspecting the generated workspace.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
