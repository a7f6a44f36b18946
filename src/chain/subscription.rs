//! Log subscriptions over WebSocket (`eth_subscribe` / `eth_unsubscribe`)

use anyhow::{anyhow, bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::chain::rpc::{LogFilter, RpcLog, RpcRequest, RpcResponse};

const SUBSCRIBE_ID: u64 = 1;
const UNSUBSCRIBE_ID: u64 = 2;

/// Scoped handle to a live log subscription.
///
/// Dropping the handle tears the subscription down: the socket task sends
/// `eth_unsubscribe`, closes the connection and stops delivering logs.
#[derive(Debug)]
pub struct EventSubscription {
    logs: mpsc::UnboundedReceiver<RpcLog>,
    cancel: Option<oneshot::Sender<()>>,
}

impl EventSubscription {
    pub fn new(logs: mpsc::UnboundedReceiver<RpcLog>, cancel: oneshot::Sender<()>) -> Self {
        EventSubscription {
            logs,
            cancel: Some(cancel),
        }
    }

    /// Next log, or `None` once the stream has ended
    pub async fn next(&mut self) -> Option<RpcLog> {
        self.logs.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    subscription: String,
    result: RpcLog,
}

/// A decoded WebSocket text frame
#[derive(Debug)]
pub enum WsFrame {
    /// Reply to one of our requests
    Response(RpcResponse),
    /// `eth_subscription` push
    Notification { subscription: String, log: RpcLog },
    /// Anything else (other subscription kinds, garbage)
    Other,
}

/// Classify a text frame received on the subscription socket
pub fn parse_frame(text: &str) -> WsFrame {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return WsFrame::Other;
    };

    if value.get("method").and_then(Value::as_str) == Some("eth_subscription") {
        return match value
            .get("params")
            .cloned()
            .map(serde_json::from_value::<NotificationParams>)
        {
            Some(Ok(params)) => WsFrame::Notification {
                subscription: params.subscription,
                log: params.result,
            },
            _ => WsFrame::Other,
        };
    }

    if value.get("id").is_some() {
        if let Ok(response) = serde_json::from_value::<RpcResponse>(value) {
            return WsFrame::Response(response);
        }
    }

    WsFrame::Other
}

/// Open a WebSocket to `url` and subscribe to logs matching `filter`.
///
/// Resolves once the node has confirmed the subscription.
pub async fn subscribe_logs(url: &str, filter: LogFilter) -> Result<EventSubscription> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .with_context(|| format!("Connection failed: {url}"))?;
    let (mut write, mut read) = ws_stream.split();

    let request = RpcRequest::new(SUBSCRIBE_ID, "eth_subscribe", json!(["logs", filter]));
    write
        .send(Message::Text(serde_json::to_string(&request)?))
        .await
        .context("sending eth_subscribe")?;

    // Wait for the subscription id
    let subscription_id: String = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match parse_frame(&text) {
                WsFrame::Response(response) if response.id == Some(SUBSCRIBE_ID) => {
                    break response.into_result()?;
                }
                _ => continue,
            },
            Some(Ok(Message::Ping(data))) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => bail!("socket closed before eth_subscribe reply"),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(anyhow!("Receive error: {e}")),
        }
    };

    tracing::info!(url, subscription = %subscription_id, "Log subscription established");

    let (logs_tx, logs_rx) = mpsc::unbounded_channel();
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                // Handle dropped by its owner
                _ = &mut cancel_rx => {
                    let request = RpcRequest::new(
                        UNSUBSCRIBE_ID,
                        "eth_unsubscribe",
                        json!([subscription_id]),
                    );
                    if let Ok(text) = serde_json::to_string(&request) {
                        let _ = write.send(Message::Text(text)).await;
                    }
                    let _ = write.close().await;
                    tracing::info!(subscription = %subscription_id, "Log subscription closed");
                    return;
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let WsFrame::Notification { subscription, log } = parse_frame(&text) {
                                if subscription != subscription_id {
                                    continue;
                                }
                                if logs_tx.send(log).is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| format!("{}: {}", f.code, f.reason))
                                .unwrap_or_else(|| "Connection closed".to_string());
                            tracing::error!(reason = %reason, "Log subscription socket closed by node");
                            return;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "Log subscription receive error");
                            return;
                        }
                        None => return,
                    }
                }
            }
        }
    });

    Ok(EventSubscription::new(logs_rx, cancel_tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::{accept_async, WebSocketStream};

    async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {other:?}"),
            }
        }
    }

    fn notification(subscription: &str, topic: u8) -> Message {
        let text = json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {
                "subscription": subscription,
                "result": {
                    "address": Address::repeat_byte(0x33),
                    "topics": [B256::repeat_byte(topic)],
                    "data": "0x"
                }
            }
        })
        .to_string();
        Message::Text(text)
    }

    #[test]
    fn test_parse_subscribe_reply() {
        let frame = parse_frame(r#"{"jsonrpc":"2.0","id":1,"result":"0xcd0c3e8af590364c09d0fa6a1210faf5"}"#);
        match frame {
            WsFrame::Response(response) => {
                assert_eq!(response.id, Some(1));
                let id: String = response.into_result().unwrap();
                assert_eq!(id, "0xcd0c3e8af590364c09d0fa6a1210faf5");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_parse_log_notification() {
        let text = json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {
                "subscription": "0x9ce59a13059e417087c02d3236a0b1cc",
                "result": {
                    "address": "0x3b7579ab94b968499218a5b95e0a9e696a8565c6",
                    "topics": [format!("0x{}", "11".repeat(32))],
                    "data": "0x",
                    "transactionHash": format!("0x{}", "22".repeat(32))
                }
            }
        })
        .to_string();

        match parse_frame(&text) {
            WsFrame::Notification { subscription, log } => {
                assert_eq!(subscription, "0x9ce59a13059e417087c02d3236a0b1cc");
                assert_eq!(
                    log.address,
                    "0x3B7579ab94b968499218A5b95E0A9E696A8565c6".parse::<Address>().unwrap()
                );
                assert_eq!(log.topics.len(), 1);
                assert!(!log.removed);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_other() {
        assert!(matches!(parse_frame("not json"), WsFrame::Other));
        assert!(matches!(parse_frame(r#"{"method":"eth_subscription"}"#), WsFrame::Other));
    }

    #[tokio::test]
    async fn test_drop_signals_cancel() {
        let (_logs_tx, logs_rx) = mpsc::unbounded_channel();
        let (cancel_tx, mut cancel_rx) = oneshot::channel();

        let subscription = EventSubscription::new(logs_rx, cancel_tx);
        assert!(cancel_rx.try_recv().is_err());

        drop(subscription);
        assert!(cancel_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_deliver_and_unsubscribe_on_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let node = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let subscribe = next_json(&mut ws).await;
            let reply = json!({"jsonrpc": "2.0", "id": subscribe["id"].clone(), "result": "0xabc"});
            ws.send(Message::Text(reply.to_string())).await.unwrap();

            // Another client's subscription on the same socket
            ws.send(notification("0xother", 0x11)).await.unwrap();
            ws.send(notification("0xabc", 0x22)).await.unwrap();

            let unsubscribe = next_json(&mut ws).await;
            (subscribe, unsubscribe)
        });

        let filter = LogFilter {
            address: Address::repeat_byte(0x33),
            topics: vec![B256::repeat_byte(0x22)],
        };
        let mut subscription = subscribe_logs(&url, filter).await.unwrap();

        let log = timeout(Duration::from_secs(5), subscription.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.topics, vec![B256::repeat_byte(0x22)]);

        drop(subscription);
        let (subscribe, unsubscribe) = timeout(Duration::from_secs(5), node)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(subscribe["method"], "eth_subscribe");
        assert_eq!(subscribe["params"][0], "logs");
        assert_eq!(
            subscribe["params"][1]["address"]
                .as_str()
                .unwrap()
                .parse::<Address>()
                .unwrap(),
            Address::repeat_byte(0x33)
        );
        assert_eq!(unsubscribe["method"], "eth_unsubscribe");
        assert_eq!(unsubscribe["id"], json!(UNSUBSCRIBE_ID));
        assert_eq!(unsubscribe["params"], json!(["0xabc"]));
    }
}
