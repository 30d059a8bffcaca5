//! tacindex-cmd — the indexer engine handle and command dispatch.
//!
//! A chain-specific binary obtains the handle, registers its extra message
//! types, and hands control to [`Indexer::execute`]:
//!
//! ```rust,no_run
//! # fn types() -> tacindex_core::MsgTypeMap { Default::default() }
//! let mut indexer = tacindex_cmd::builtin_indexer();
//! indexer.register_custom_msg_types_by_type_urls(types())?;
//! indexer.execute()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::Parser;
use tacindex_core::error::RegistryError;
use tacindex_core::msg::MsgTypeMap;
use tacindex_core::registry::MsgTypeRegistry;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::CmdError;
pub use logging::{init_tracing, LogConfig};

/// The indexer engine: a message type registry plus the command line.
#[derive(Debug, Default)]
pub struct Indexer {
    registry: MsgTypeRegistry,
}

/// Return the engine handle with an empty registry.
///
/// Also installs the global tracing subscriber with default settings, so
/// log lines emitted before [`Indexer::execute`] are visible.
pub fn builtin_indexer() -> Indexer {
    init_tracing(&LogConfig::default());
    Indexer::default()
}

impl Indexer {
    /// Register extra message types, keyed by type URL.
    ///
    /// All-or-nothing: on error no type from `types` is registered.
    pub fn register_custom_msg_types_by_type_urls(
        &mut self,
        types: MsgTypeMap,
    ) -> Result<(), RegistryError> {
        let count = types.len();
        self.registry.register_all(types)?;
        tracing::debug!(count, total = self.registry.len(), "registered custom message types");
        Ok(())
    }

    pub fn registry(&self) -> &MsgTypeRegistry {
        &self.registry
    }

    /// Parse the process arguments and run the selected command.
    pub fn execute(self) -> Result<(), CmdError> {
        self.execute_from(std::env::args_os())
    }

    /// Like [`Indexer::execute`] with explicit arguments (`args[0]` is the
    /// program name).
    pub fn execute_from<I, T>(self, args: I) -> Result<(), CmdError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.print()?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut config = cli.load_config()?;
        init_tracing(&config.log);

        match cli.command {
            Commands::Index {
                overrides,
                start_height,
                end_height,
                reindex,
                blocks_only,
            } => {
                overrides.apply(&mut config);
                if start_height.is_some() {
                    config.base.start_height = start_height;
                }
                if end_height.is_some() {
                    config.base.end_height = end_height;
                }
                config.base.reindex |= reindex;
                if blocks_only {
                    config.base.index_transactions = false;
                }
                config.validate()?;
                commands::run_index(config, self.registry)
            }
            Commands::Types => {
                commands::print_types(&self.registry);
                Ok(())
            }
            Commands::Info { overrides } => {
                overrides.apply(&mut config);
                config.validate()?;
                commands::print_info(&config, &self.registry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use tacindex_core::error::MsgError;
    use tacindex_core::msg::{AccAddress, Msg, ProtoMessage};

    #[derive(Debug)]
    struct Vote;

    impl fmt::Display for Vote {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("MsgVote")
        }
    }

    impl ProtoMessage for Vote {
        fn reset(&mut self) {}
    }

    impl Msg for Vote {
        fn route(&self) -> &str {
            "gov"
        }
        fn msg_type(&self) -> &str {
            "vote"
        }
        fn validate_basic(&self) -> Result<(), MsgError> {
            Ok(())
        }
        fn sign_bytes(&self) -> Vec<u8> {
            vec![]
        }
        fn signers(&self) -> Vec<AccAddress> {
            vec![]
        }
    }

    fn vote_types() -> MsgTypeMap {
        let mut types = MsgTypeMap::new();
        types.insert("/cosmos.gov.v1.MsgVote".to_string(), Box::new(Vote) as Box<dyn Msg>);
        types
    }

    #[test]
    fn registers_custom_types() {
        let mut indexer = builtin_indexer();
        indexer.register_custom_msg_types_by_type_urls(vote_types()).unwrap();
        assert!(indexer.registry().contains("/cosmos.gov.v1.MsgVote"));

        let err = indexer
            .register_custom_msg_types_by_type_urls(vote_types())
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));
        assert_eq!(indexer.registry().len(), 1);
    }

    #[test]
    fn help_and_version_succeed() {
        Indexer::default().execute_from(["tac-indexer", "--help"]).unwrap();
        Indexer::default().execute_from(["tac-indexer", "--version"]).unwrap();
    }

    #[test]
    fn types_command_runs() {
        let mut indexer = Indexer::default();
        indexer.register_custom_msg_types_by_type_urls(vote_types()).unwrap();
        indexer.execute_from(["tac-indexer", "types"]).unwrap();
    }

    #[test]
    fn usage_errors_are_reported() {
        let err = Indexer::default()
            .execute_from(["tac-indexer", "no-such-command"])
            .unwrap_err();
        assert!(matches!(err, CmdError::Cli(_)));

        let err = Indexer::default().execute_from(["tac-indexer"]).unwrap_err();
        assert!(matches!(err, CmdError::Cli(_)));
    }

    #[test]
    fn missing_config_file_fails() {
        let err = Indexer::default()
            .execute_from(["tac-indexer", "info", "--config", "/nonexistent/tac.toml"])
            .unwrap_err();
        assert!(matches!(err, CmdError::ConfigRead { .. }));
    }

    #[test]
    fn inverted_range_is_rejected_before_connecting() {
        let err = Indexer::default()
            .execute_from([
                "tac-indexer",
                "index",
                "--start-height",
                "20",
                "--end-height",
                "10",
            ])
            .unwrap_err();
        assert!(matches!(err, CmdError::Config(_)));
    }
}
