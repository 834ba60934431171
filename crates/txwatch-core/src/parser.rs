//! `Parser` — the query/command surface over a running scanner.
//!
//! Reads go straight to the address index, so they see whatever has been
//! indexed so far; nothing here waits for the scanner to catch up.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::ScannerConfig;
use crate::error::IndexError;
use crate::reader::ChainReader;
use crate::scanner::{ScanStatus, Scanner, ScannerHandle};
use crate::shutdown::Shutdown;
use crate::store::AddressIndex;
use crate::types::TxRecord;

/// Address-indexed view of the chain, fed by one background [`Scanner`].
pub struct Parser {
    reader: Arc<dyn ChainReader>,
    index: Arc<dyn AddressIndex>,
    scanner: ScannerHandle,
}

impl Parser {
    /// Validate `config` and start the scanner on the current Tokio runtime.
    ///
    /// The scanner runs until `shutdown` fires or a block fetch fails for good.
    pub fn new(
        config: ScannerConfig,
        index: Arc<dyn AddressIndex>,
        reader: Arc<dyn ChainReader>,
        shutdown: Shutdown,
    ) -> Result<Self, IndexError> {
        config.validate()?;
        let scanner = Scanner::new(config, Arc::clone(&reader), Arc::clone(&index), shutdown).spawn();
        Ok(Self {
            reader,
            index,
            scanner,
        })
    }

    /// Current chain head height.
    ///
    /// # Panics
    /// If the chain reader fails. A node that cannot report its height is
    /// treated as fatal; use [`Parser::try_current_height`] to handle it.
    pub async fn current_height(&self) -> u64 {
        match self.try_current_height().await {
            Ok(height) => height,
            Err(e) => {
                error!(endpoint = self.reader.endpoint(), error = %e, "Failed to get current height");
                panic!("failed to get current height from {}: {e}", self.reader.endpoint());
            }
        }
    }

    /// Current chain head height, surfacing reader errors.
    pub async fn try_current_height(&self) -> Result<u64, IndexError> {
        self.reader.current_height().await
    }

    /// Start tracking `address` by appending a subscription marker.
    ///
    /// Returns `false` if the marker could not be stored. Subscribing twice
    /// appends two markers.
    pub async fn subscribe(&self, address: &str) -> bool {
        match self.index.append(address, TxRecord::marker()).await {
            Ok(()) => {
                info!(address, "Subscribed");
                true
            }
            Err(e) => {
                error!(address, error = %e, "Subscribe failed");
                false
            }
        }
    }

    /// Everything filed under `address`, markers included, in append order.
    ///
    /// Unknown addresses and lookup failures both yield an empty list.
    pub async fn transactions_for(&self, address: &str) -> Vec<TxRecord> {
        match self.index.get(address).await {
            Ok(records) => records,
            Err(e) => {
                if !e.is_not_found() {
                    debug!(address, error = %e, "Lookup failed");
                }
                Vec::new()
            }
        }
    }

    /// Returns `true` if `address` has at least one subscription marker.
    pub async fn is_subscribed(&self, address: &str) -> bool {
        self.transactions_for(address)
            .await
            .iter()
            .any(TxRecord::is_marker)
    }

    /// Every indexed address; empty if the index cannot enumerate its keys.
    pub async fn addresses(&self) -> Vec<String> {
        self.index.keys().await.unwrap_or_else(|e| {
            debug!(error = %e, "Key enumeration failed");
            Vec::new()
        })
    }

    /// Latest scanner status.
    pub fn status(&self) -> ScanStatus {
        self.scanner.status()
    }

    /// Last fully scanned height.
    pub fn last_scanned(&self) -> Option<u64> {
        self.scanner.status().last_scanned
    }

    /// Wait until the scanner has indexed `height` or stopped.
    pub async fn wait_for_height(&self, height: u64) -> ScanStatus {
        self.scanner.wait_for_height(height).await
    }

    /// Wait for the scanner task to exit (fire the shutdown signal first).
    ///
    /// Returns the fetch error if the scanner halted.
    pub async fn join(self) -> Result<(), IndexError> {
        self.scanner.join().await
    }
}
