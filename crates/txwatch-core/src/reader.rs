//! The `ChainReader` trait — the two chain calls the scanner and facade need.

use async_trait::async_trait;

use crate::error::IndexError;
use crate::types::Block;

/// Read access to the chain.
///
/// Implementations must be `Send + Sync` so they can be shared as
/// `Arc<dyn ChainReader>` between the scanner task and the facade.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current head height.
    async fn current_height(&self) -> Result<u64, IndexError>;

    /// Fetch the block at `height` with its full transaction list.
    ///
    /// Returns [`IndexError::NotFound`] if the chain has no such block yet.
    async fn block_by_height(&self, height: u64) -> Result<Block, IndexError>;

    /// Identifier of the remote end (URL or name).
    fn endpoint(&self) -> &str;
}
