//! The message contract every registered type URL must satisfy.
//!
//! The indexer never decodes message payloads itself: a registered type URL
//! maps to a prototype implementing [`Msg`], and the prototype tells the
//! indexer how to route, label and validate messages of that kind.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::MsgError;

/// A bech32 account address (e.g. `tac1…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccAddress(String);

impl AccAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire-format surface of a protobuf message.
///
/// `Display` is the human-readable label.
pub trait ProtoMessage: fmt::Display {
    /// Clear the message back to its zero value.
    fn reset(&mut self);
}

/// A Cosmos SDK message kind the indexer can recognise.
pub trait Msg: ProtoMessage + fmt::Debug + Send + Sync {
    /// Routing category (module name), e.g. `"bank"` or `"evm"`.
    fn route(&self) -> &str;

    /// Message type label, e.g. `"send"`.
    fn msg_type(&self) -> &str;

    /// Stateless validity check.
    fn validate_basic(&self) -> Result<(), MsgError>;

    /// Canonical bytes that signers sign over.
    fn sign_bytes(&self) -> Vec<u8>;

    /// Addresses required to sign this message.
    fn signers(&self) -> Vec<AccAddress>;
}

/// Type URL → message prototype, as handed to
/// [`MsgTypeRegistry::register_all`](crate::registry::MsgTypeRegistry::register_all).
pub type MsgTypeMap = HashMap<String, Box<dyn Msg>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acc_address_is_transparent() {
        let addr = AccAddress::new("tac1qqqq");
        assert_eq!(addr.to_string(), "tac1qqqq");
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"tac1qqqq\"");
    }
}
