//! Wallet provider - account custody and transaction signing live behind
//! this trait; the client only brokers requests to it.

use std::future::Future;

use alloy_primitives::{Address, Bytes, B256};
use anyhow::{anyhow, Result};
use serde_json::json;

use crate::chain::rpc::{LogFilter, RpcClient, RpcError, TransactionCall, TxReceipt, METHOD_NOT_FOUND};
use crate::chain::subscription::{self, EventSubscription};
use crate::config::ChainConfig;

/// Everything the client needs from a wallet provider
pub trait WalletProvider: Clone + Send + Sync + 'static {
    /// Accounts the user has already authorized (`eth_accounts`)
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Ask the user to authorize accounts (`eth_requestAccounts`)
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Read-only contract call against the latest block
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes>> + Send;

    /// Sign and broadcast a transaction, returning its hash
    fn send_transaction(&self, tx: TransactionCall) -> impl Future<Output = Result<B256>> + Send;

    /// Receipt for `hash`, `None` while the transaction is still pending
    fn transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<TxReceipt>>> + Send;

    /// Subscribe to logs matching `filter`
    fn subscribe_logs(
        &self,
        filter: LogFilter,
    ) -> impl Future<Output = Result<EventSubscription>> + Send;
}

/// Wallet provider reached over Ethereum JSON-RPC.
///
/// Requests go over HTTP; log subscriptions open their own WebSocket.
#[derive(Clone, Debug)]
pub struct JsonRpcProvider {
    rpc: RpcClient,
    ws_url: String,
}

impl JsonRpcProvider {
    pub fn new(rpc_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        JsonRpcProvider {
            rpc: RpcClient::new(rpc_url),
            ws_url: ws_url.into(),
        }
    }
}

impl WalletProvider for JsonRpcProvider {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.rpc.request("eth_requestAccounts", json!([])).await {
            // Plain nodes only know eth_accounts; their unlocked accounts are already authorized
            Err(e)
                if e.downcast_ref::<RpcError>()
                    .is_some_and(|rpc| rpc.code == METHOD_NOT_FOUND) =>
            {
                tracing::info!(url = self.rpc.url(), "eth_requestAccounts unsupported, using eth_accounts");
                self.accounts().await
            }
            other => other,
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.rpc
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(&self, tx: TransactionCall) -> Result<B256> {
        self.rpc.request("eth_sendTransaction", json!([tx])).await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        self.rpc
            .request("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    async fn subscribe_logs(&self, filter: LogFilter) -> Result<EventSubscription> {
        subscription::subscribe_logs(&self.ws_url, filter).await
    }
}

/// Detects the wallet provider and brokers account access
#[derive(Clone, Debug)]
pub struct WalletConnector<P> {
    provider: Option<P>,
}

impl WalletConnector<JsonRpcProvider> {
    /// Look for a provider in the configuration
    pub fn detect(config: &ChainConfig) -> Self {
        if config.has_provider() {
            tracing::info!(rpc_url = %config.rpc_url, ws_url = %config.ws_url, "Wallet provider found");
            WalletConnector::new(Some(JsonRpcProvider::new(
                config.rpc_url.clone(),
                config.ws_url.clone(),
            )))
        } else {
            tracing::error!("No wallet provider configured");
            WalletConnector::new(None)
        }
    }
}

impl<P: WalletProvider> WalletConnector<P> {
    pub fn new(provider: Option<P>) -> Self {
        WalletConnector { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    /// First already-authorized account, if any
    pub async fn authorized_account(&self) -> Result<Option<Address>> {
        let provider = self.require()?;
        Ok(provider.accounts().await?.into_iter().next())
    }

    /// Ask for authorization and return the first granted account
    pub async fn request_account(&self) -> Result<Address> {
        let provider = self.require()?;
        provider
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("wallet provider returned no accounts"))
    }

    fn require(&self) -> Result<&P> {
        self.provider
            .as_ref()
            .ok_or_else(|| anyhow!("no wallet provider detected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockProvider;
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Body of one HTTP request
    async fn read_body(socket: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return Vec::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let start = end + 4;
            while buf.len() < start + len {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return buf[start..].to_vec();
        }
    }

    /// Local JSON-RPC node answering each method with `reply(method)`
    async fn serve_rpc(reply: fn(&str) -> Value) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let body = read_body(&mut socket).await;
                    let request: Value = serde_json::from_slice(&body).unwrap();
                    let mut response = reply(request["method"].as_str().unwrap_or_default());
                    response["jsonrpc"] = json!("2.0");
                    response["id"] = request["id"].clone();

                    let body = response.to_string();
                    let http = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    socket.write_all(http.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                });
            }
        });

        url
    }

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    #[test]
    fn test_detect_without_rpc_url() {
        let config = ChainConfig {
            rpc_url: String::new(),
            ..ChainConfig::default()
        };
        assert!(!WalletConnector::detect(&config).is_available());
        assert!(WalletConnector::detect(&ChainConfig::default()).is_available());
    }

    #[tokio::test]
    async fn test_missing_provider_is_an_error() {
        let connector: WalletConnector<MockProvider> = WalletConnector::new(None);
        assert!(connector.authorized_account().await.is_err());
        assert!(connector.request_account().await.is_err());
    }

    #[tokio::test]
    async fn test_authorized_account_takes_first() {
        let mock = MockProvider::new();
        mock.set_accounts(vec![alice(), Address::repeat_byte(0xb2)]);
        let connector = WalletConnector::new(Some(mock));
        assert_eq!(connector.authorized_account().await.unwrap(), Some(alice()));
    }

    #[tokio::test]
    async fn test_no_authorized_account() {
        let connector = WalletConnector::new(Some(MockProvider::new()));
        assert_eq!(connector.authorized_account().await.unwrap(), None);
        assert!(connector.request_account().await.is_err());
    }

    #[tokio::test]
    async fn test_request_account_grants() {
        let mock = MockProvider::new();
        mock.set_requestable_accounts(vec![alice()]);
        let connector = WalletConnector::new(Some(mock));
        assert_eq!(connector.request_account().await.unwrap(), alice());
    }

    #[tokio::test]
    async fn test_request_accounts_falls_back_on_method_not_found() {
        let url = serve_rpc(|method| match method {
            "eth_requestAccounts" => json!({"error": {"code": -32601, "message": "Method not found"}}),
            "eth_accounts" => json!({"result": ["0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"]}),
            _ => json!({"error": {"code": -32000, "message": "unexpected"}}),
        })
        .await;

        let provider = JsonRpcProvider::new(url, "");
        assert_eq!(provider.request_accounts().await.unwrap(), vec![alice()]);
    }

    #[tokio::test]
    async fn test_request_accounts_rejection_propagates() {
        let url = serve_rpc(|method| match method {
            "eth_requestAccounts" => json!({"error": {"code": 4001, "message": "User rejected the request."}}),
            _ => json!({"result": ["0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"]}),
        })
        .await;

        let provider = JsonRpcProvider::new(url, "");
        let err = provider.request_accounts().await.unwrap_err();
        assert_eq!(err.downcast_ref::<RpcError>().map(|e| e.code), Some(4001));
    }
}
