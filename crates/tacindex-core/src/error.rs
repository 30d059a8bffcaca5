//! Error types for the tacindex pipeline.

use thiserror::Error;

/// Errors that can occur during indexing.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Decode error at height {height}: {reason}")]
    Decode { height: u64, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain mismatch at height {height}: expected parent {expected}, got {actual}")]
    ChainMismatch {
        height: u64,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl IndexerError {
    /// Returns `true` if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}

/// Errors raised while registering message types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid type URL {type_url:?}: {reason}")]
    InvalidTypeUrl { type_url: String, reason: String },

    #[error("type URL {type_url} is already registered")]
    AlreadyRegistered { type_url: String },
}

/// Error returned by [`crate::msg::Msg::validate_basic`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsgError {
    #[error("invalid message: {0}")]
    Invalid(String),

    #[error("missing signer")]
    MissingSigner,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_converts() {
        let err: IndexerError = RegistryError::AlreadyRegistered {
            type_url: "/a.B".into(),
        }
        .into();
        assert_eq!(err.to_string(), "type URL /a.B is already registered");
        assert!(!err.is_transient());
    }
}
