//! `txwatch` configuration file.
//!
//! ```json
//! {
//!   "rpc_url": "https://ethereum-rpc.publicnode.com",
//!   "db": "./txwatch.db",
//!   "scanner": { "start_height": 19912329, "poll_interval_ms": 30 },
//!   "log": { "level": "info", "components": { "txwatch-core": "debug" } },
//!   "watch": ["0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5"]
//! }
//! ```
//!
//! Every field is optional.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use txwatch_core::{FetchFailurePolicy, RetryConfig, ScannerConfig};
use txwatch_evm::DEFAULT_RPC_URL;

use crate::logging::LogConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// SQLite database file; the in-memory index is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Addresses subscribed at startup.
    #[serde(default)]
    pub watch: Vec<String>,
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

/// Retry budget used while following the head: 0.5s doubling to a 2s cap,
/// 60 retries, about two minutes before giving up on a block. Ethereum
/// produces one roughly every 12 seconds.
pub fn follow_head_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 60,
        initial_backoff_ms: 500,
        max_backoff_ms: 2_000,
        multiplier: 2.0,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            db: None,
            scanner: ScannerConfig::default(),
            log: LogConfig::default(),
            watch: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid config JSON")?;
        config.scanner.validate()?;
        Ok(config)
    }

    /// Pin the start height, resolving `0` to the current `head`.
    ///
    /// A scanner that starts at the head asks for blocks the node does not
    /// have yet, so when it would otherwise halt on the first miss it waits
    /// with [`follow_head_retry`] instead.
    pub fn resolve_start(&mut self, head: u64) {
        if self.scanner.start_height != 0 {
            return;
        }
        self.scanner.start_height = head;
        if self.scanner.fetch_failure == FetchFailurePolicy::Halt {
            self.scanner.fetch_failure = FetchFailurePolicy::Retry(follow_head_retry());
        }
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use txwatch_core::FanOutMode;

    #[test]
    fn empty_object_is_all_defaults() {
        let cfg = AppConfig::from_json("{}").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.rpc_url, "https://ethereum-rpc.publicnode.com");
        assert!(cfg.db.is_none());
    }

    #[test]
    fn full_config() {
        let cfg = AppConfig::from_json(
            r#"{
                "rpc_url": "http://localhost:8545",
                "db": "./txwatch.db",
                "scanner": { "start_height": 100, "fan_out": "last_write_per_address" },
                "log": { "level": "debug", "json": true },
                "watch": ["0xa", "0xb"]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.rpc_url, "http://localhost:8545");
        assert_eq!(cfg.db.as_deref(), Some("./txwatch.db"));
        assert_eq!(cfg.scanner.start_height, 100);
        assert_eq!(cfg.scanner.fan_out, FanOutMode::LastWritePerAddress);
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.watch, vec!["0xa", "0xb"]);
    }

    #[test]
    fn invalid_scanner_config_is_rejected() {
        let err = AppConfig::from_json(r#"{"scanner": {"poll_interval_ms": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn following_head_waits_for_new_blocks() {
        let mut cfg = AppConfig::default();
        cfg.resolve_start(19_912_329);
        assert_eq!(cfg.scanner.start_height, 19_912_329);
        assert_eq!(cfg.scanner.fetch_failure, FetchFailurePolicy::Retry(follow_head_retry()));
        assert!(cfg.scanner.validate().is_ok());

        let budget: Duration = (1..=60).filter_map(|n| follow_head_retry().backoff(n)).sum();
        assert!(budget > Duration::from_secs(12));
        assert_eq!(follow_head_retry().backoff(61), None);
    }

    #[test]
    fn fixed_start_keeps_configured_policy() {
        let mut cfg = AppConfig::default();
        cfg.scanner.start_height = 100;
        cfg.resolve_start(19_912_329);
        assert_eq!(cfg.scanner.start_height, 100);
        assert_eq!(cfg.scanner.fetch_failure, FetchFailurePolicy::Halt);
    }

    #[test]
    fn following_head_keeps_explicit_retry() {
        let mut cfg = AppConfig::from_json(
            r#"{"scanner": {"fetch_failure": {"retry": {"max_retries": 3}}}}"#,
        )
        .unwrap();
        cfg.resolve_start(500);
        assert_eq!(cfg.scanner.start_height, 500);
        match cfg.scanner.fetch_failure {
            FetchFailurePolicy::Retry(r) => assert_eq!(r.max_retries, 3),
            other => panic!("unexpected policy {other:?}"),
        }
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = AppConfig::load("/nonexistent/txwatch.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/txwatch.json"));
    }
}
