//! Command-line configuration.
//!
//! Settings come from an optional JSON file and are overridden by flags
//! (or `COUNTER_NODES` for the node list).

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use counter::ServiceConfig;
use tracing::Level;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "counter-cli", version, about = "Sharded page-visit counter tools")]
pub struct CliConfig {
    /// JSON configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Comma-separated node identifiers, e.g. `redis-a,redis-b`.
    #[arg(long, env = "COUNTER_NODES", global = true)]
    pub nodes: Option<String>,

    /// Virtual positions per node.
    #[arg(long, global = true)]
    pub virtual_nodes: Option<usize>,

    /// Cache TTL in seconds.
    #[arg(long, global = true)]
    pub cache_ttl_secs: Option<u64>,

    /// Log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Merge the config file (if any) with flag overrides and validate.
    pub fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                ServiceConfig::from_json_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => ServiceConfig::default(),
        };

        if let Some(nodes) = &self.nodes {
            config.set_nodes_csv(nodes);
        }
        if let Some(virtual_nodes) = self.virtual_nodes {
            config.virtual_nodes = virtual_nodes;
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache_ttl_secs = ttl;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);
        let config = self.service_config()?;
        tracing::debug!(?config, "resolved configuration");

        let result = self.command.execute(&config)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
