//! Exponential backoff for block fetch retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often, and how patiently, a failed block fetch is retried.
///
/// ```json
/// { "max_retries": 5, "initial_backoff_ms": 500, "max_backoff_ms": 30000, "multiplier": 2.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first failed try; 0 disables retrying.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap on a single pause, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_retries() -> u32 { 5 }
fn default_initial_backoff_ms() -> u64 { 500 }
fn default_max_backoff_ms() -> u64 { 30_000 }
fn default_multiplier() -> f64 { 2.0 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Pause before retry number `retry` (1-based), or `None` when the
    /// retry budget is spent.
    pub fn backoff(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let exp = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let ms = (self.initial_backoff_ms as f64 * self.multiplier.powi(exp))
            .min(self.max_backoff_ms as f64);
        Some(Duration::from_millis(ms as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_retries: u32, initial: u64, cap: u64, multiplier: f64) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: initial,
            max_backoff_ms: cap,
            multiplier,
        }
    }

    #[test]
    fn pauses_grow_geometrically() {
        let retry = cfg(3, 100, 30_000, 2.0);
        let pauses: Vec<_> = (1..=4).map(|n| retry.backoff(n)).collect();
        assert_eq!(
            pauses,
            [
                Some(Duration::from_millis(100)),
                Some(Duration::from_millis(200)),
                Some(Duration::from_millis(400)),
                None,
            ]
        );
    }

    #[test]
    fn pause_never_exceeds_cap() {
        assert_eq!(cfg(10, 100, 500, 10.0).backoff(5), Some(Duration::from_millis(500)));
    }

    #[test]
    fn no_budget_no_retry() {
        assert_eq!(cfg(0, 100, 500, 2.0).backoff(1), None);
        assert_eq!(RetryConfig::default().backoff(0), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let retry: RetryConfig = serde_json::from_str(r#"{"max_retries": 2}"#).unwrap();
        assert_eq!(retry, RetryConfig { max_retries: 2, ..Default::default() });
    }
}
