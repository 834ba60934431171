//! In-memory address index.
//!
//! Keeps every address's records in RAM. Nothing survives a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use txwatch_core::error::IndexError;
use txwatch_core::store::AddressIndex;
use txwatch_core::types::TxRecord;

/// In-memory address index.
///
/// Appends take the write lock for the duration of a single push, so a
/// concurrent reader sees either the old or the new sequence, never a torn one.
#[derive(Default)]
pub struct InMemoryAddressIndex {
    entries: RwLock<HashMap<String, Vec<TxRecord>>>,
}

impl InMemoryAddressIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed addresses.
    pub fn address_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Total number of records across all addresses.
    pub fn record_count(&self) -> usize {
        self.entries
            .read()
            .map(|e| e.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> IndexError {
    IndexError::Storage("in-memory index lock poisoned".into())
}

#[async_trait]
impl AddressIndex for InMemoryAddressIndex {
    fn name(&self) -> &str {
        "inmemory"
    }

    async fn append(&self, address: &str, record: TxRecord) -> Result<(), IndexError> {
        self.entries
            .write()
            .map_err(poisoned)?
            .entry(address.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn get(&self, address: &str) -> Result<Vec<TxRecord>, IndexError> {
        self.entries
            .read()
            .map_err(poisoned)?
            .get(address)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(format!("address {address}")))
    }

    async fn keys(&self) -> Result<Vec<String>, IndexError> {
        Ok(self.entries.read().map_err(poisoned)?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use txwatch_core::types::Direction;

    fn rec(hash: &str, kind: Direction) -> TxRecord {
        TxRecord {
            block_height: "0x64".into(),
            hash: hash.into(),
            from: "0xa".into(),
            to: "0xb".into(),
            kind,
        }
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let store = InMemoryAddressIndex::new();
        store.append("0xa", rec("0x1", Direction::Outbound)).await.unwrap();
        store.append("0xa", rec("0x2", Direction::Inbound)).await.unwrap();

        let got = store.get("0xa").await.unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].hash, "0x1");
        assert_eq!(got[1].hash, "0x2");
    }

    #[tokio::test]
    async fn append_is_not_idempotent() {
        let store = InMemoryAddressIndex::new();
        store.append("0xa", TxRecord::marker()).await.unwrap();
        store.append("0xa", TxRecord::marker()).await.unwrap();
        assert_eq!(store.get("0xa").await.unwrap().len(), 2);
        assert_eq!(store.record_count(), 2);
    }

    #[tokio::test]
    async fn unknown_address_is_not_found() {
        let store = InMemoryAddressIndex::new();
        let err = store.get("0xmissing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn keys_list_every_address() {
        let store = InMemoryAddressIndex::new();
        assert!(store.keys().await.unwrap().is_empty());

        store.append("0xa", rec("0x1", Direction::Outbound)).await.unwrap();
        store.append("0xb", rec("0x1", Direction::Inbound)).await.unwrap();
        store.append("0xc", TxRecord::marker()).await.unwrap();

        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["0xa", "0xb", "0xc"]);
        assert_eq!(store.address_count(), 3);
    }

    #[tokio::test]
    async fn keys_are_case_sensitive() {
        let store = InMemoryAddressIndex::new();
        store.append("0xAB", TxRecord::marker()).await.unwrap();
        assert!(store.get("0xab").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryAddressIndex::new());
        let tasks = (0..8).map(|t| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..50 {
                    let hash = format!("0x{t}{i}");
                    store.append("0xshared", rec(&hash, Direction::Inbound)).await.unwrap();
                    store.append(&format!("0x{t}"), rec(&hash, Direction::Outbound)).await.unwrap();
                }
            })
        });
        for res in futures::future::join_all(tasks).await {
            res.unwrap();
        }

        assert_eq!(store.get("0xshared").await.unwrap().len(), 400);
        assert_eq!(store.address_count(), 9);
        assert_eq!(store.record_count(), 800);
    }
}
