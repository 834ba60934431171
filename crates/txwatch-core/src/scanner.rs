//! The block scanner — advances the cursor one block at a time and files
//! every transaction under the addresses it touches.
//!
//! # Step
//! 1. Fetch block `h = cursor + 1`
//! 2. Fan out: one `outbound` record under `from`, one `inbound` under `to`
//! 3. Append each record to the address index (failures are logged and dropped)
//! 4. Advance the cursor to `h`
//!
//! Steps never overlap: the poll interval is slept *after* a step finishes.
//! A failed fetch stops the loop for good unless the config asks for retries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{FanOutMode, FetchFailurePolicy, ScannerConfig, ScannerState};
use crate::cursor::Cursor;
use crate::error::IndexError;
use crate::reader::ChainReader;
use crate::shutdown::Shutdown;
use crate::store::AddressIndex;
use crate::types::{Block, TxRecord};

/// Snapshot of scanner progress, published after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatus {
    /// Last fully scanned height.
    pub last_scanned: Option<u64>,
    pub state: ScannerState,
}

/// Derive the `(address, record)` pairs to store for one block.
pub fn fan_out(block: &Block, mode: FanOutMode) -> Vec<(String, TxRecord)> {
    let derived = block.transactions.iter().flat_map(|tx| {
        let outbound = Some((tx.from.clone(), TxRecord::outbound(tx)));
        let inbound = tx.to.as_ref().map(|to| (to.clone(), TxRecord::inbound(tx)));
        outbound.into_iter().chain(inbound)
    });

    match mode {
        FanOutMode::Accumulate => derived.collect(),
        FanOutMode::LastWritePerAddress => {
            let mut slots: Vec<(String, TxRecord)> = Vec::new();
            let mut by_address: HashMap<String, usize> = HashMap::new();
            for (address, record) in derived {
                match by_address.get(&address) {
                    Some(&i) => slots[i].1 = record,
                    None => {
                        by_address.insert(address.clone(), slots.len());
                        slots.push((address, record));
                    }
                }
            }
            slots
        }
    }
}

/// Background scanner. Build with [`Scanner::new`], then [`Scanner::spawn`].
pub struct Scanner {
    config: ScannerConfig,
    reader: Arc<dyn ChainReader>,
    index: Arc<dyn AddressIndex>,
    cursor: Cursor,
    shutdown: Shutdown,
    status: watch::Sender<ScanStatus>,
}

impl Scanner {
    pub fn new(
        config: ScannerConfig,
        reader: Arc<dyn ChainReader>,
        index: Arc<dyn AddressIndex>,
        shutdown: Shutdown,
    ) -> Self {
        let cursor = Cursor::starting_at(config.start_height);
        let (status, _) = watch::channel(ScanStatus {
            last_scanned: cursor.last_scanned(),
            state: ScannerState::Idle,
        });
        Self {
            config,
            reader,
            index,
            cursor,
            shutdown,
            status,
        }
    }

    /// Current cursor position.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Receiver for progress updates.
    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status.subscribe()
    }

    /// Run the loop on a new Tokio task.
    pub fn spawn(self) -> ScannerHandle {
        let status = self.subscribe();
        let task = tokio::spawn(self.run());
        ScannerHandle { status, task }
    }

    /// Run until cancelled or until a fetch fails for good.
    ///
    /// Returns `Ok(())` on cancellation and the fetch error on halt.
    pub async fn run(mut self) -> Result<(), IndexError> {
        let mut shutdown = self.shutdown.clone();
        let interval = self.config.poll_interval();

        info!(
            start = self.cursor.next_height(),
            interval_ms = self.config.poll_interval_ms,
            reader = self.reader.endpoint(),
            index = self.index.name(),
            "Scanner started"
        );

        loop {
            let woke = tokio::select! {
                biased;
                _ = shutdown.cancelled() => false,
                _ = tokio::time::sleep(interval) => true,
            };
            if !woke {
                self.stop_cancelled();
                return Ok(());
            }

            let height = self.cursor.next_height();
            self.set_state(ScannerState::Fetching);

            let fetched = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                res = self.fetch(height) => Some(res),
            };
            let block = match fetched {
                None => {
                    self.stop_cancelled();
                    return Ok(());
                }
                Some(Ok(block)) => block,
                Some(Err(e)) => {
                    error!(
                        height,
                        last_scanned = ?self.cursor.last_scanned(),
                        error = %e,
                        "Block fetch failed, scanner halted"
                    );
                    self.set_state(ScannerState::Halted);
                    return Err(e);
                }
            };

            self.index_block(height, &block).await;
        }
    }

    /// Scan exactly one block: fetch `cursor + 1`, store its records, advance.
    ///
    /// Returns the scanned height. On a fetch error the cursor is untouched.
    pub async fn step(&mut self) -> Result<u64, IndexError> {
        let height = self.cursor.next_height();
        self.set_state(ScannerState::Fetching);
        match self.fetch(height).await {
            Ok(block) => {
                self.index_block(height, &block).await;
                Ok(height)
            }
            Err(e) => {
                self.set_state(ScannerState::Idle);
                Err(e)
            }
        }
    }

    /// Fetch `height`, applying the configured failure policy.
    async fn fetch(&self, height: u64) -> Result<Block, IndexError> {
        let retry = match &self.config.fetch_failure {
            FetchFailurePolicy::Halt => return self.reader.block_by_height(height).await,
            FetchFailurePolicy::Retry(retry) => retry,
        };

        let mut attempt = 0u32;
        loop {
            match self.reader.block_by_height(height).await {
                Ok(block) => return Ok(block),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    match retry.backoff(attempt) {
                        Some(delay) => {
                            warn!(
                                height,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "Retrying block fetch"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Store the fanned-out records of `block`, then advance the cursor.
    async fn index_block(&mut self, height: u64, block: &Block) {
        self.set_state(ScannerState::Storing);

        let records = fan_out(block, self.config.fan_out);
        let total = records.len();
        let mut dropped = 0usize;
        for (address, record) in records {
            if let Err(e) = self.index.append(&address, record).await {
                dropped += 1;
                warn!(height, address = %address, error = %e, "Dropping record");
            }
        }

        self.cursor.advance(height);
        self.status.send_replace(ScanStatus {
            last_scanned: self.cursor.last_scanned(),
            state: ScannerState::Idle,
        });

        debug!(
            height,
            txs = block.transactions.len(),
            records = total,
            dropped,
            "Block scanned"
        );
    }

    fn set_state(&self, state: ScannerState) {
        self.status.send_modify(|s| s.state = state);
    }

    fn stop_cancelled(&self) {
        info!(last_scanned = ?self.cursor.last_scanned(), "Scanner cancelled");
        self.set_state(ScannerState::Cancelled);
    }
}

/// Handle to a spawned scanner task.
pub struct ScannerHandle {
    status: watch::Receiver<ScanStatus>,
    task: JoinHandle<Result<(), IndexError>>,
}

impl ScannerHandle {
    /// Latest published status.
    pub fn status(&self) -> ScanStatus {
        *self.status.borrow()
    }

    /// A receiver for progress updates.
    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status.clone()
    }

    /// Wait until the cursor reaches `height` or the scanner stops.
    pub async fn wait_for_height(&self, height: u64) -> ScanStatus {
        let mut rx = self.status.clone();
        let reached = rx
            .wait_for(|s| s.last_scanned.is_some_and(|h| h >= height) || s.state.is_terminal())
            .await
            .map(|s| *s);
        reached.unwrap_or_else(|_| *rx.borrow())
    }

    /// Wait for the scanner task to exit.
    pub async fn join(self) -> Result<(), IndexError> {
        self.task
            .await
            .map_err(|e| IndexError::Other(format!("scanner task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChainTransaction;
    use crate::types::Direction;

    fn tx(hash: &str, from: &str, to: Option<&str>) -> ChainTransaction {
        ChainTransaction {
            hash: hash.into(),
            block_height: "0x64".into(),
            from: from.into(),
            to: to.map(str::to_string),
        }
    }

    fn block(txs: Vec<ChainTransaction>) -> Block {
        Block {
            height: "0x64".into(),
            hash: "0xblock".into(),
            transactions: txs,
        }
    }

    #[test]
    fn fan_out_two_records_per_tx() {
        let b = block(vec![tx("0x1", "0xa", Some("0xb"))]);
        let recs = fan_out(&b, FanOutMode::Accumulate);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].0, "0xa");
        assert_eq!(recs[0].1.kind, Direction::Outbound);
        assert_eq!(recs[1].0, "0xb");
        assert_eq!(recs[1].1.kind, Direction::Inbound);
    }

    #[test]
    fn fan_out_skips_missing_recipient() {
        let b = block(vec![tx("0x1", "0xa", None)]);
        let recs = fan_out(&b, FanOutMode::Accumulate);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].0, "0xa");
    }

    #[test]
    fn accumulate_keeps_every_record_for_repeated_address() {
        let b = block(vec![
            tx("0x1", "0xa", Some("0xb")),
            tx("0x2", "0xa", Some("0xc")),
        ]);
        let recs = fan_out(&b, FanOutMode::Accumulate);
        let for_a: Vec<_> = recs.iter().filter(|(a, _)| a == "0xa").collect();
        assert_eq!(for_a.len(), 2);
    }

    #[test]
    fn last_write_keeps_only_final_record_per_address() {
        let b = block(vec![
            tx("0x1", "0xa", Some("0xb")),
            tx("0x2", "0xa", Some("0xc")),
            tx("0x3", "0xc", Some("0xa")),
        ]);
        let recs = fan_out(&b, FanOutMode::LastWritePerAddress);
        assert_eq!(recs.len(), 3); // 0xa, 0xb, 0xc

        let a = &recs.iter().find(|(addr, _)| addr == "0xa").unwrap().1;
        assert_eq!(a.hash, "0x3");
        assert_eq!(a.kind, Direction::Inbound);

        let c = &recs.iter().find(|(addr, _)| addr == "0xc").unwrap().1;
        assert_eq!(c.hash, "0x3");
        assert_eq!(c.kind, Direction::Outbound);
    }

    #[test]
    fn self_transfer_last_write_keeps_inbound() {
        let b = block(vec![tx("0x1", "0xa", Some("0xa"))]);
        let recs = fan_out(&b, FanOutMode::LastWritePerAddress);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].1.kind, Direction::Inbound);

        let recs = fan_out(&b, FanOutMode::Accumulate);
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn empty_block_yields_nothing() {
        assert!(fan_out(&block(vec![]), FanOutMode::Accumulate).is_empty());
    }
}
