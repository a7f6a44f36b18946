//! WavePortal contract proxy - ABI bindings, reads, the `wave` write and
//! `NewWave` event decoding.

use std::time::Duration;

use alloy_primitives::{Address, LogData, B256, U64};
use alloy_sol_types::{sol, SolCall, SolEvent};
use anyhow::{bail, Context, Result};

use crate::chain::rpc::{LogFilter, RpcLog, TransactionCall};
use crate::chain::subscription::EventSubscription;
use crate::chain::wallet::WalletProvider;
use crate::config::ChainConfig;
use crate::models::{MinedTx, Wave};

sol! {
    interface WavePortal {
        struct Wave {
            address waver;
            string message;
            uint256 timestamp;
        }

        event NewWave(address indexed from, uint256 timestamp, string message);

        function getTotalWaves() external view returns (uint256);
        function getAllWaves() external view returns (Wave[] memory);
        function wave(string memory _message) external;
    }
}

/// Session bound to a provider and the deployed contract
#[derive(Clone, Debug)]
pub struct WavePortalContract<P> {
    provider: P,
    address: Address,
    gas_limit: u64,
    poll_interval: Duration,
}

impl<P: WalletProvider> WavePortalContract<P> {
    pub fn new(provider: P, config: &ChainConfig) -> Self {
        WavePortalContract {
            provider,
            address: config.contract_address,
            gas_limit: config.gas_limit,
            poll_interval: config.receipt_poll_interval(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Running total of waves recorded by the contract
    pub async fn total_waves(&self) -> Result<u64> {
        let data = WavePortal::getTotalWavesCall {}.abi_encode();
        let output = self
            .provider
            .call(self.address, data.into())
            .await
            .context("getTotalWaves")?;
        let total = WavePortal::getTotalWavesCall::abi_decode_returns(&output)
            .context("decoding getTotalWaves")?;
        Ok(total.saturating_to::<u64>())
    }

    /// Full wave history, in contract order
    pub async fn all_waves(&self) -> Result<Vec<Wave>> {
        let data = WavePortal::getAllWavesCall {}.abi_encode();
        let output = self
            .provider
            .call(self.address, data.into())
            .await
            .context("getAllWaves")?;
        let waves = WavePortal::getAllWavesCall::abi_decode_returns(&output)
            .context("decoding getAllWaves")?;
        Ok(waves
            .into_iter()
            .map(|w| Wave::from_chain(w.waver, w.timestamp, w.message))
            .collect())
    }

    /// Submit `message` from `from`, returning the transaction hash
    pub async fn wave(&self, from: Address, message: &str) -> Result<B256> {
        let data = WavePortal::waveCall {
            _message: message.to_string(),
        }
        .abi_encode();
        let tx = TransactionCall {
            from,
            to: self.address,
            data: data.into(),
            gas: U64::from(self.gas_limit),
        };
        self.provider.send_transaction(tx).await.context("wave")
    }

    /// Poll until `hash` is included. Never gives up on its own.
    pub async fn wait_mined(&self, hash: B256) -> Result<MinedTx> {
        loop {
            if let Some(receipt) = self.provider.transaction_receipt(hash).await? {
                if receipt.reverted() {
                    bail!("transaction {hash} reverted");
                }
                return Ok(MinedTx {
                    hash,
                    block_number: receipt.block_number.map(|n| n.to::<u64>()),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Filter matching this contract's `NewWave` events
    pub fn new_wave_filter(&self) -> LogFilter {
        LogFilter {
            address: self.address,
            topics: vec![WavePortal::NewWave::SIGNATURE_HASH],
        }
    }

    pub async fn subscribe_new_waves(&self) -> Result<EventSubscription> {
        self.provider
            .subscribe_logs(self.new_wave_filter())
            .await
            .context("subscribing to NewWave")
    }
}

/// Decode a `NewWave` log into a wave record
pub fn decode_new_wave(log: &RpcLog) -> Result<Wave> {
    let data = LogData::new(log.topics.clone(), log.data.clone())
        .context("log has too many topics")?;
    let event = WavePortal::NewWave::decode_log_data(&data).context("decoding NewWave")?;
    Ok(Wave::from_chain(event.from, event.timestamp, event.message))
}
