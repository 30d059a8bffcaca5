use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "tac-indexer",
    about = "Cosmos block and transaction indexer for the TAC chain",
    long_about = "
Indexes blocks, transactions and messages from a TAC node into PostgreSQL
(or memory), resolving message type URLs against the registered types.

ENVIRONMENT VARIABLES:
  TAC_INDEXER_RPC        CometBFT RPC URL           (probe.rpc)
  TAC_INDEXER_API        Cosmos LCD URL             (probe.api)
  TAC_INDEXER_CHAIN_ID   Expected chain ID          (probe.chain_id)
  DATABASE_URL           PostgreSQL connection URL  (database.url)
  RUST_LOG               Log filter, overrides --log-level
",
    version
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Index blocks and transactions from the configured node
    Index {
        #[command(flatten)]
        overrides: Overrides,
        /// First height to index
        #[arg(long)]
        start_height: Option<u64>,
        /// Stop after this height
        #[arg(long)]
        end_height: Option<u64>,
        /// Ignore the saved checkpoint
        #[arg(long)]
        reindex: bool,
        /// Index block headers only
        #[arg(long)]
        blocks_only: bool,
    },

    /// List the registered message type URLs
    Types,

    /// Print the effective configuration
    Info {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Connection settings that override the config file.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// CometBFT RPC URL
    #[arg(long, env = "TAC_INDEXER_RPC")]
    pub rpc: Option<String>,
    /// Cosmos LCD (REST) URL
    #[arg(long, env = "TAC_INDEXER_API")]
    pub api: Option<String>,
    /// Chain ID the node must report
    #[arg(long, env = "TAC_INDEXER_CHAIN_ID")]
    pub chain_id: Option<String>,
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Checkpoint key
    #[arg(long)]
    pub indexer_id: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(rpc) = &self.rpc {
            config.probe.rpc = rpc.clone();
        }
        if let Some(api) = &self.api {
            config.probe.api = api.clone();
        }
        if let Some(chain_id) = &self.chain_id {
            config.probe.chain_id = chain_id.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if let Some(id) = &self.indexer_id {
            config.base.indexer_id = id.clone();
        }
    }
}

impl Cli {
    /// Load the config file (or defaults) and apply global flags.
    pub fn load_config(&self) -> Result<Config, crate::error::CmdError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if self.log_json {
            config.log.json = true;
        }
        Ok(config)
    }
}
