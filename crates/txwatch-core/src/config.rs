//! Scanner configuration and state types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::retry::RetryConfig;

/// How the transactions of one block are turned into stored records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutMode {
    /// Store every derived record.
    #[default]
    Accumulate,
    /// Store only the last record derived for each address within a block.
    ///
    /// Earlier transactions touching the same address in the same block are
    /// lost. Kept for parity with indexes built by older deployments.
    LastWritePerAddress,
}

/// What the scanner does when fetching the next block fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailurePolicy {
    /// Stop scanning for good. The failed height is never retried or skipped.
    #[default]
    Halt,
    /// Retry the same height with exponential backoff, then halt once the
    /// retries are exhausted.
    Retry(RetryConfig),
}

/// Configuration for a scanner instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// First height to scan.
    #[serde(default)]
    pub start_height: u64,
    /// Pause between the end of one step and the start of the next (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub fan_out: FanOutMode,
    #[serde(default)]
    pub fetch_failure: FetchFailurePolicy,
}

fn default_poll_interval_ms() -> u64 { 30 }

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            start_height: 0,
            poll_interval_ms: default_poll_interval_ms(),
            fan_out: FanOutMode::default(),
            fetch_failure: FetchFailurePolicy::default(),
        }
    }
}

impl ScannerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject configurations the scanner cannot run with.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.poll_interval_ms == 0 {
            return Err(IndexError::Config("poll_interval_ms must be greater than 0".into()));
        }
        if let FetchFailurePolicy::Retry(retry) = &self.fetch_failure {
            if retry.multiplier < 1.0 {
                return Err(IndexError::Config(format!(
                    "retry multiplier must be at least 1.0, got {}",
                    retry.multiplier
                )));
            }
        }
        Ok(())
    }
}

/// Runtime state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannerState {
    /// Waiting for the next step.
    Idle,
    /// Fetching the next block.
    Fetching,
    /// Writing the derived records of a fetched block.
    Storing,
    /// Stopped by the shutdown signal.
    Cancelled,
    /// Stopped by a fetch failure.
    Halted,
}

impl ScannerState {
    /// Returns `true` once the scanner task has exited.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Halted)
    }
}

impl std::fmt::Display for ScannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Storing => write!(f, "storing"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Halted => write!(f, "halted"),
        }
    }
}
