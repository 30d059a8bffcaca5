//! Tracing / logging initialisation.
//!
//! The subscriber is installed once, by [`crate::builtin_indexer`], with the
//! default settings. Level and format stay reloadable so the values from the
//! config file and command line can be applied once they are parsed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
    /// Override per component: crate name → level
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            components: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    /// Directive string: `"info,tacindex_cosmos=debug"` etc.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

type FormatLayer = Box<dyn Layer<Registry> + Send + Sync>;
type Formatted = Layered<reload::Layer<FormatLayer, Registry>, Registry>;

struct Handles {
    format: reload::Handle<FormatLayer, Registry>,
    filter: reload::Handle<EnvFilter, Formatted>,
}

static HANDLES: OnceLock<Handles> = OnceLock::new();

fn format_layer(json: bool) -> FormatLayer {
    if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    }
}

/// `RUST_LOG` wins over the configured directives when set.
fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber, or reconfigure it if already installed.
///
/// Does nothing when another global subscriber was set by someone else.
pub fn init_tracing(config: &LogConfig) {
    if let Some(handles) = HANDLES.get() {
        if let Err(e) = handles.format.reload(format_layer(config.json)) {
            tracing::warn!(error = %e, "failed to switch log format");
        }
        if let Err(e) = handles.filter.reload(env_filter(config)) {
            tracing::warn!(error = %e, "failed to update log filter");
        }
        return;
    }

    let (format, format_handle) = reload::Layer::new(format_layer(config.json));
    let (filter, filter_handle) = reload::Layer::new(env_filter(config));

    if tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init()
        .is_ok()
    {
        let _ = HANDLES.set(Handles {
            format: format_handle,
            filter: filter_handle,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_components() {
        let mut config = LogConfig {
            level: "warn".into(),
            ..LogConfig::default()
        };
        config
            .components
            .insert("tacindex-cosmos".into(), "debug".into());
        assert_eq!(config.directives(), "warn,tacindex_cosmos=debug");
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init_tracing(&LogConfig::default());
        init_tracing(&LogConfig {
            level: "debug".into(),
            json: true,
            ..LogConfig::default()
        });
    }
}
