//! txwatch-evm — Ethereum JSON-RPC chain reader for txwatch.
//!
//! Provides:
//! - [`EthRpcClient`]: a [`ChainReader`](txwatch_core::ChainReader) over
//!   HTTP JSON-RPC (`eth_blockNumber`, `eth_getBlockByNumber`)
//! - [`ScannerBuilder`]: fluent builder for `ScannerConfig`
//! - [`jsonrpc`]: JSON-RPC 2.0 envelope types

pub mod builder;
pub mod client;
pub mod jsonrpc;

pub use builder::ScannerBuilder;
pub use client::{EthRpcClient, DEFAULT_RPC_URL};
