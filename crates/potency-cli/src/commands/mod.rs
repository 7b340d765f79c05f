//! CLI command implementations
//!
//! Each subcommand has its own module.

pub mod config;
pub mod predict;
