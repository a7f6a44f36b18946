//! In-memory wallet provider for tests

use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use anyhow::{anyhow, bail, Result};
use tokio::sync::{mpsc, oneshot};

use crate::chain::contract::WavePortal;
use crate::chain::rpc::{LogFilter, RpcLog, TransactionCall, TxReceipt};
use crate::chain::subscription::EventSubscription;
use crate::chain::wallet::WalletProvider;
use crate::models::Wave;

#[derive(Default)]
struct MockState {
    accounts: Vec<Address>,
    requestable_accounts: Vec<Address>,
    total_waves: u64,
    waves: Vec<Wave>,
    sent: Vec<TransactionCall>,
    receipt_after_polls: usize,
    receipt_polls: usize,
    revert: bool,
    fail_calls: bool,
    fail_send: bool,
    hold_receipt: bool,
    log_senders: Vec<mpsc::UnboundedSender<RpcLog>>,
    cancels: Vec<(oneshot::Receiver<()>, bool)>,
    filters: Vec<LogFilter>,
}

/// Scriptable provider; clones share state
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.with(|s| s.accounts = accounts);
    }

    pub fn set_requestable_accounts(&self, accounts: Vec<Address>) {
        self.with(|s| s.requestable_accounts = accounts);
    }

    pub fn set_total_waves(&self, total: u64) {
        self.with(|s| s.total_waves = total);
    }

    pub fn set_waves(&self, waves: Vec<Wave>) {
        self.with(|s| s.waves = waves);
    }

    pub fn set_receipt_after_polls(&self, polls: usize) {
        self.with(|s| s.receipt_after_polls = polls);
    }

    pub fn set_revert(&self, revert: bool) {
        self.with(|s| s.revert = revert);
    }

    pub fn set_fail_calls(&self, fail: bool) {
        self.with(|s| s.fail_calls = fail);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.with(|s| s.fail_send = fail);
    }

    /// Keep every transaction pending while set
    pub fn set_hold_receipt(&self, hold: bool) {
        self.with(|s| s.hold_receipt = hold);
    }

    pub fn sent_transactions(&self) -> Vec<TransactionCall> {
        self.with(|s| s.sent.clone())
    }

    pub fn receipt_polls(&self) -> usize {
        self.with(|s| s.receipt_polls)
    }

    pub fn subscription_filters(&self) -> Vec<LogFilter> {
        self.with(|s| s.filters.clone())
    }

    /// Push a log to every live subscription; returns how many received it
    pub fn emit(&self, log: RpcLog) -> usize {
        self.with(|s| {
            s.log_senders.retain(|tx| !tx.is_closed());
            s.log_senders
                .iter()
                .filter(|tx| tx.send(log.clone()).is_ok())
                .count()
        })
    }

    /// Close every live log stream, as a node dropping the socket would
    pub fn end_subscriptions(&self) {
        self.with(|s| s.log_senders.clear());
    }

    /// Number of subscriptions whose handle has been dropped
    pub fn cancelled_subscriptions(&self) -> usize {
        self.with(|s| {
            for (rx, cancelled) in s.cancels.iter_mut() {
                if !*cancelled && rx.try_recv().is_ok() {
                    *cancelled = true;
                }
            }
            s.cancels.iter().filter(|(_, cancelled)| *cancelled).count()
        })
    }
}

/// Build the log a node would deliver for a `NewWave` emission
pub fn new_wave_log(contract: Address, from: Address, timestamp: u64, message: &str) -> RpcLog {
    let event = WavePortal::NewWave {
        from,
        timestamp: U256::from(timestamp),
        message: message.to_string(),
    };
    let data = event.encode_log_data();
    RpcLog {
        address: contract,
        topics: data.topics().to_vec(),
        data: data.data.clone(),
        transaction_hash: Some(B256::repeat_byte(0x77)),
        removed: false,
    }
}

fn to_chain(wave: &Wave) -> WavePortal::Wave {
    WavePortal::Wave {
        waver: wave.address,
        message: wave.message.clone(),
        timestamp: U256::from(wave.timestamp.timestamp().max(0) as u64),
    }
}

impl WalletProvider for MockProvider {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.with(|s| s.accounts.clone()))
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.with(|s| {
            if s.requestable_accounts.is_empty() {
                s.accounts.clone()
            } else {
                s.requestable_accounts.clone()
            }
        }))
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
        let (fail, total, waves) =
            self.with(|s| (s.fail_calls, s.total_waves, s.waves.clone()));
        if fail {
            bail!("execution reverted");
        }

        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| anyhow!("calldata too short"))?;

        if selector == WavePortal::getTotalWavesCall::SELECTOR {
            Ok(U256::from(total).abi_encode().into())
        } else if selector == WavePortal::getAllWavesCall::SELECTOR {
            let chain: Vec<WavePortal::Wave> = waves.iter().map(to_chain).collect();
            Ok(chain.abi_encode().into())
        } else {
            bail!("unknown selector")
        }
    }

    async fn send_transaction(&self, tx: TransactionCall) -> Result<B256> {
        self.with(|s| {
            if s.fail_send {
                bail!("user rejected the request");
            }
            s.sent.push(tx);
            Ok(B256::with_last_byte(s.sent.len() as u8))
        })
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        Ok(self.with(|s| {
            s.receipt_polls += 1;
            if s.hold_receipt || s.receipt_polls < s.receipt_after_polls {
                return None;
            }
            Some(TxReceipt {
                transaction_hash: hash,
                block_number: Some(U64::from(1)),
                status: Some(if s.revert { U64::ZERO } else { U64::from(1) }),
            })
        }))
    }

    async fn subscribe_logs(&self, filter: LogFilter) -> Result<EventSubscription> {
        let (logs_tx, logs_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.with(|s| {
            s.filters.push(filter);
            s.log_senders.push(logs_tx);
            s.cancels.push((cancel_rx, false));
        });
        Ok(EventSubscription::new(logs_rx, cancel_tx))
    }
}
