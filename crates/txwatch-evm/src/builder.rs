//! Fluent builder API for scanner configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use txwatch_evm::ScannerBuilder;
//! use txwatch_core::RetryConfig;
//!
//! let config = ScannerBuilder::new()
//!     .start_height(19_912_329)
//!     .poll_interval_ms(30)
//!     .retry(RetryConfig::default())
//!     .build_config();
//! ```

use txwatch_core::config::{FanOutMode, FetchFailurePolicy, ScannerConfig};
use txwatch_core::retry::RetryConfig;

/// Fluent builder for `ScannerConfig`.
#[derive(Default)]
pub struct ScannerBuilder {
    config: ScannerConfig,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    /// Set the first height to scan.
    pub fn start_height(mut self, height: u64) -> Self {
        self.config.start_height = height;
        self
    }

    /// Set the pause between scan steps in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn fan_out(mut self, mode: FanOutMode) -> Self {
        self.config.fan_out = mode;
        self
    }

    /// Keep only the last record per address within each block.
    pub fn last_write_per_address(self) -> Self {
        self.fan_out(FanOutMode::LastWritePerAddress)
    }

    pub fn fetch_failure(mut self, policy: FetchFailurePolicy) -> Self {
        self.config.fetch_failure = policy;
        self
    }

    /// Retry failed block fetches instead of halting on the first failure.
    pub fn retry(self, retry: RetryConfig) -> Self {
        self.fetch_failure(FetchFailurePolicy::Retry(retry))
    }

    /// Build the `ScannerConfig`.
    pub fn build_config(self) -> ScannerConfig {
        self.config
    }
}
