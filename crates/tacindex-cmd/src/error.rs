use thiserror::Error;

use tacindex_core::error::IndexerError;

/// Errors returned by [`crate::Indexer::execute`].
#[derive(Debug, Error)]
pub enum CmdError {
    /// Bad command line; the message is clap's rendered usage error.
    #[error("{0}")]
    Cli(#[from] clap::Error),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Indexer(#[from] IndexerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_not_reported_as_runtime_failures() {
        let err: CmdError = std::io::Error::other("broken pipe").into();
        assert!(matches!(err, CmdError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: broken pipe");
    }
}
