//! HTTP JSON-RPC chain reader backed by `reqwest`.
//!
//! Speaks the two Ethereum methods the scanner needs:
//! `eth_blockNumber` and `eth_getBlockByNumber` (with full transactions).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use txwatch_core::error::IndexError;
use txwatch_core::quantity::{decode_quantity, encode_quantity};
use txwatch_core::reader::ChainReader;
use txwatch_core::types::Block;

use crate::jsonrpc::{Request, Response};

/// Public Ethereum mainnet endpoint used when nothing else is configured.
pub const DEFAULT_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";

/// Ethereum JSON-RPC client over HTTP POST.
pub struct EthRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl EthRpcClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, IndexError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| IndexError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a client with a 30 second request timeout.
    pub fn default_for(url: impl Into<String>) -> Result<Self, IndexError> {
        Self::new(url, Duration::from_secs(30))
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, IndexError> {
        let req = Request::new(self.next_id(), method, params);
        debug!(method, id = req.id, url = %self.url, "rpc call");

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| IndexError::Rpc(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IndexError::Rpc(format!("HTTP {status}: {body}")));
        }

        resp.json::<Response>()
            .await
            .map_err(|e| IndexError::Rpc(format!("{method}: malformed response: {e}")))?
            .into_result(method)
    }
}

#[async_trait]
impl ChainReader for EthRpcClient {
    async fn current_height(&self) -> Result<u64, IndexError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        height_from_result(&result)
    }

    async fn block_by_height(&self, height: u64) -> Result<Block, IndexError> {
        let result = self
            .call("eth_getBlockByNumber", json!([encode_quantity(height), true]))
            .await?;
        block_from_result(result, height)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Decode an `eth_blockNumber` result. Anything but a `"0x"` string is rejected.
pub fn height_from_result(result: &Value) -> Result<u64, IndexError> {
    let s = result
        .as_str()
        .ok_or_else(|| IndexError::InvalidQuantity(format!("expected hex string, got {result}")))?;
    decode_quantity(s)
}

/// Decode an `eth_getBlockByNumber` result; `null` means the block does not exist yet.
pub fn block_from_result(result: Value, height: u64) -> Result<Block, IndexError> {
    if result.is_null() {
        return Err(IndexError::NotFound(format!("block {}", encode_quantity(height))));
    }
    serde_json::from_value(result)
        .map_err(|e| IndexError::Rpc(format!("block {}: {e}", encode_quantity(height))))
}
