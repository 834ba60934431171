//! The `AddressIndex` trait — append-only per-address activity logs.

use async_trait::async_trait;

use crate::error::IndexError;
use crate::types::TxRecord;

/// Mapping from address to the ordered list of records filed under it.
///
/// Addresses are compared as exact strings. Implementations must tolerate
/// concurrent writers (the scanner task and `subscribe` callers) and
/// concurrent readers.
///
/// Implementations include `InMemoryAddressIndex` and `SqliteAddressIndex`
/// in `txwatch-storage`.
#[async_trait]
pub trait AddressIndex: Send + Sync {
    /// Backend identifier (e.g. `"inmemory"`).
    fn name(&self) -> &str;

    /// Append one record under `address`, creating the entry if absent.
    ///
    /// Not idempotent: appending the same record twice stores it twice.
    async fn append(&self, address: &str, record: TxRecord) -> Result<(), IndexError>;

    /// All records under `address`, in append order.
    ///
    /// Returns [`IndexError::NotFound`] iff nothing was ever appended for it.
    async fn get(&self, address: &str) -> Result<Vec<TxRecord>, IndexError>;

    /// Every address with at least one record, subscription markers included.
    async fn keys(&self) -> Result<Vec<String>, IndexError>;
}
