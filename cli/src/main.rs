//! tac-indexer CLI.
//!
//! Usage:
//! ```bash
//! tac-indexer index --config tac-indexer.toml
//! tac-indexer types
//! tac-indexer info
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match tac_indexer::run(tacindex_cmd::builtin_indexer()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
