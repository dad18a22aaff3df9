//! CLI tool for inspecting the counter ring and exercising the service.
//!
//! Provides commands for:
//! - Routing keys to nodes
//! - Inspecting key distribution and keyspace ownership
//! - Measuring remapping when a node leaves
//! - Recording page visits through the cached service

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
