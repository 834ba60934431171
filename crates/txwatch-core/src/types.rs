//! Shared types for the scanning pipeline.

use serde::{Deserialize, Serialize};

// ─── Direction ────────────────────────────────────────────────────────────────

/// Which side of a transaction an indexed address was on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The address received the transaction (`to`).
    Inbound,
    /// The address sent the transaction (`from`).
    Outbound,
    /// Neither; only used by subscription markers.
    #[default]
    Unspecified,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

// ─── TxRecord ─────────────────────────────────────────────────────────────────

/// One entry in an address's activity log.
///
/// A zero-valued record (`TxRecord::default()`) is the subscription marker:
/// subscribing an address appends one under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    /// Height of the containing block as a hex quantity (`0x…`).
    pub block_height: String,
    /// Transaction hash.
    pub hash: String,
    pub from: String,
    pub to: String,
    pub kind: Direction,
}

impl TxRecord {
    /// The record written by `subscribe`.
    pub fn marker() -> Self {
        Self::default()
    }

    /// Returns `true` if this is a subscription marker rather than real activity.
    pub fn is_marker(&self) -> bool {
        *self == Self::default()
    }

    /// Derive the record filed under `tx.from`.
    pub fn outbound(tx: &ChainTransaction) -> Self {
        Self::from_tx(tx, Direction::Outbound)
    }

    /// Derive the record filed under `tx.to`.
    pub fn inbound(tx: &ChainTransaction) -> Self {
        Self::from_tx(tx, Direction::Inbound)
    }

    fn from_tx(tx: &ChainTransaction, kind: Direction) -> Self {
        Self {
            block_height: tx.block_height.clone(),
            hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone().unwrap_or_default(),
            kind,
        }
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A transaction as delivered by the chain reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransaction {
    pub hash: String,
    /// Height of the containing block as a hex quantity.
    #[serde(rename = "blockNumber")]
    pub block_height: String,
    pub from: String,
    /// Recipient; `None` for contract creations.
    #[serde(default)]
    pub to: Option<String>,
}

/// A block with its full transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height as a hex quantity.
    #[serde(rename = "number")]
    pub height: String,
    /// Block hash (`0x…`).
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub transactions: Vec<ChainTransaction>,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
