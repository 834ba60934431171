//! Tracing initialisation for the `txwatch` binary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level, per-crate overrides, and output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-crate overrides, e.g. `{"txwatch-core": "debug"}`.
    #[serde(default)]
    pub components: HashMap<String, String>,
    /// One JSON object per line instead of text.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: HashMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directives, e.g. `"info,txwatch_core=debug"`.
    pub fn directives(&self) -> String {
        let mut overrides: Vec<_> = self
            .components
            .iter()
            .map(|(krate, level)| format!("{}={level}", krate.replace('-', "_")))
            .collect();
        overrides.sort();
        std::iter::once(self.level.clone()).chain(overrides).collect::<Vec<_>>().join(",")
    }
}

/// Install the global subscriber. Call once, before anything logs.
///
/// `RUST_LOG` takes precedence over the configured directives when set.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directives()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (text, json) = if config.json {
        (None, Some(fmt::layer().json().with_current_span(false)))
    } else {
        (Some(fmt::layer().with_target(false)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}
