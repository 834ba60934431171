//! Scanner cursor — tracks the last successfully scanned height.

use serde::{Deserialize, Serialize};

/// The scanner's position in the chain.
///
/// Only ever moves forward, one height at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Last height that was fully scanned; `None` before the first step
    /// when scanning starts at genesis.
    last_scanned: Option<u64>,
}

impl Cursor {
    /// Create a cursor positioned so that the first step scans `start_height`.
    pub fn starting_at(start_height: u64) -> Self {
        Self {
            last_scanned: start_height.checked_sub(1),
        }
    }

    /// Last fully scanned height.
    pub fn last_scanned(&self) -> Option<u64> {
        self.last_scanned
    }

    /// Returns the next height to scan (cursor + 1).
    pub fn next_height(&self) -> u64 {
        self.last_scanned.map_or(0, |h| h + 1)
    }

    /// Record `height` as scanned. Must be exactly `next_height()`.
    pub fn advance(&mut self, height: u64) {
        debug_assert_eq!(height, self.next_height(), "cursor must advance by one");
        self.last_scanned = Some(height);
    }
}
