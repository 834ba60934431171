//! JSON-RPC 2.0 envelopes, just enough for single (non-batched) calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use txwatch_core::error::IndexError;

/// Outgoing call. Borrows the method name; ids are numeric.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Error member of a failed response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl std::fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// Incoming reply. The id is kept as raw JSON since nodes differ on
/// echoing it back as a number or a string.
#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// The result of `method`; an absent result reads as `null`.
    pub fn into_result(self, method: &str) -> Result<Value, IndexError> {
        match self.error {
            Some(err) => Err(IndexError::Rpc(format!("{method}: {err}"))),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
