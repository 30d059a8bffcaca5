//! Type-URL registry — maps protobuf `Any` type URLs to message prototypes.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::msg::{Msg, MsgTypeMap};

/// Registry of message kinds known to the indexer, keyed by type URL
/// (e.g. `"/cosmos.bank.v1beta1.MsgSend"`).
#[derive(Debug, Default)]
pub struct MsgTypeRegistry {
    types: HashMap<String, Box<dyn Msg>>,
}

impl MsgTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single prototype under `type_url`.
    pub fn register(
        &mut self,
        type_url: impl Into<String>,
        msg: Box<dyn Msg>,
    ) -> Result<(), RegistryError> {
        let type_url = type_url.into();
        self.check_new(&type_url)?;
        tracing::debug!(
            %type_url,
            route = msg.route(),
            msg_type = msg.msg_type(),
            "registered message type"
        );
        self.types.insert(type_url, msg);
        Ok(())
    }

    /// Register every entry of `map`.
    ///
    /// All-or-nothing: if any type URL is malformed or already registered,
    /// the registry is left untouched.
    pub fn register_all(&mut self, map: MsgTypeMap) -> Result<(), RegistryError> {
        let mut urls: Vec<&String> = map.keys().collect();
        urls.sort();
        for url in urls {
            self.check_new(url)?;
        }
        for (type_url, msg) in map {
            tracing::debug!(
                %type_url,
                route = msg.route(),
                msg_type = msg.msg_type(),
                "registered message type"
            );
            self.types.insert(type_url, msg);
        }
        Ok(())
    }

    /// Look up the prototype registered for `type_url`.
    pub fn get(&self, type_url: &str) -> Option<&dyn Msg> {
        self.types.get(type_url).map(|m| m.as_ref())
    }

    pub fn contains(&self, type_url: &str) -> bool {
        self.types.contains_key(type_url)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All registered type URLs, sorted.
    pub fn type_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.types.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    fn check_new(&self, type_url: &str) -> Result<(), RegistryError> {
        validate_type_url(type_url)?;
        if self.types.contains_key(type_url) {
            return Err(RegistryError::AlreadyRegistered {
                type_url: type_url.to_string(),
            });
        }
        Ok(())
    }
}

/// Check that `type_url` looks like `/<package>.<Message>`.
pub fn validate_type_url(type_url: &str) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidTypeUrl {
        type_url: type_url.to_string(),
        reason: reason.to_string(),
    };

    let name = type_url
        .strip_prefix('/')
        .ok_or_else(|| invalid("must start with '/'"))?;
    if name.is_empty() {
        return Err(invalid("empty message name"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace"));
    }

    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2 {
        return Err(invalid("message name must be package-qualified"));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("empty name segment"));
    }
    if !segments
        .iter()
        .all(|s| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        return Err(invalid("name segments must be alphanumeric"));
    }
    Ok(())
}
