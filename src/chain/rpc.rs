//! JSON-RPC 2.0 plumbing - request envelopes, typed results and wire shapes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U64};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `-32601`, returned by nodes that do not implement a method
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Error object returned by a JSON-RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Turn the envelope into the typed result or the typed RPC error
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        let value = self.result.unwrap_or(Value::Null);
        serde_json::from_value(value).context("decoding JSON-RPC result")
    }
}

/// Transaction fields sent with `eth_sendTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCall {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas: U64,
}

/// Subset of a transaction receipt the client cares about
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` success, `0x0` revert; absent on pre-Byzantium chains
    #[serde(default)]
    pub status: Option<U64>,
}

impl TxReceipt {
    pub fn reverted(&self) -> bool {
        self.status == Some(U64::ZERO)
    }
}

/// Log filter for `eth_subscribe("logs", ..)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<B256>,
}

/// A log as delivered by the node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub removed: bool,
}

/// HTTP JSON-RPC client
#[derive(Clone, Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        RpcClient {
            http: create_client(),
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and decode its result
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, method, "JSON-RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("{method} timed out (30s)")
                } else if e.is_connect() {
                    anyhow::anyhow!("Connection failed: {e}")
                } else {
                    anyhow::anyhow!("{method} failed: {e}")
                }
            })?;

        let envelope = response
            .json::<RpcResponse>()
            .await
            .with_context(|| format!("reading {method} response"))?;
        envelope.into_result()
    }
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
