//! Chain actor - runs contract calls and owns the NewWave listener

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::chain::contract::{decode_new_wave, WavePortalContract};
use crate::chain::rpc::RpcLog;
use crate::chain::subscription::EventSubscription;
use crate::chain::wallet::{WalletConnector, WalletProvider};
use crate::config::ChainConfig;
use crate::messages::{ChainCommand, ChainOp, ChainResponse};

/// The installed listener and the id the App knows it by
struct ActiveSubscription {
    id: u64,
    handle: EventSubscription,
}

/// Chain actor that processes contract commands
pub struct ChainActor<P> {
    wallet: WalletConnector<P>,
    contract: Option<WavePortalContract<P>>,
    response_tx: mpsc::UnboundedSender<ChainResponse>,
    tasks: JoinSet<()>,
    subscription: Option<ActiveSubscription>,
    wanted_subscription: Option<u64>,
    subscribed_tx: mpsc::UnboundedSender<(u64, Result<EventSubscription>)>,
    subscribed_rx: mpsc::UnboundedReceiver<(u64, Result<EventSubscription>)>,
}

impl<P: WalletProvider> ChainActor<P> {
    pub fn new(
        wallet: WalletConnector<P>,
        config: &ChainConfig,
        response_tx: mpsc::UnboundedSender<ChainResponse>,
    ) -> Self {
        let contract = wallet
            .provider()
            .map(|provider| WavePortalContract::new(provider.clone(), config));
        let (subscribed_tx, subscribed_rx) = mpsc::unbounded_channel();

        ChainActor {
            wallet,
            contract,
            response_tx,
            tasks: JoinSet::new(),
            subscription: None,
            wanted_subscription: None,
            subscribed_tx,
            subscribed_rx,
        }
    }

    /// Run the chain actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<ChainCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ChainCommand::Shutdown) | None => {
                            self.subscription = None;
                            self.tasks.abort_all();
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                    }
                }

                // Listener installed (or failed) in the background
                Some((id, result)) = self.subscribed_rx.recv() => {
                    self.install_subscription(id, result);
                }

                Some((id, log)) = next_log(&mut self.subscription) => {
                    self.forward_log(id, log);
                }

                // Clean up completed tasks
                Some(_result) = self.tasks.join_next() => {}
            }
        }
    }

    fn handle_command(&mut self, cmd: ChainCommand) {
        let op = match &cmd {
            ChainCommand::CheckConnection => ChainOp::CheckConnection,
            ChainCommand::ConnectWallet => ChainOp::ConnectWallet,
            ChainCommand::FetchWaveCount => ChainOp::FetchWaveCount,
            ChainCommand::FetchAllWaves => ChainOp::FetchAllWaves,
            ChainCommand::SubmitWave { .. } => ChainOp::SubmitWave,
            ChainCommand::Subscribe { .. } => ChainOp::Subscribe,
            ChainCommand::Unsubscribe { id } => {
                self.unsubscribe(*id);
                return;
            }
            ChainCommand::Shutdown => return,
        };

        let Some(contract) = self.contract.clone() else {
            let id = match &cmd {
                ChainCommand::SubmitWave { id, .. } | ChainCommand::Subscribe { id } => Some(*id),
                _ => None,
            };
            tracing::error!(%op, "No wallet provider detected");
            let _ = self.response_tx.send(ChainResponse::ProviderMissing { op, id });
            return;
        };

        let wallet = self.wallet.clone();
        let response_tx = self.response_tx.clone();

        match cmd {
            ChainCommand::CheckConnection => {
                self.tasks.spawn(async move {
                    let response = match wallet.authorized_account().await {
                        Ok(Some(account)) => ChainResponse::AccountFound(account),
                        Ok(None) => ChainResponse::NoAuthorizedAccount,
                        Err(e) => failed(op, None, e),
                    };
                    let _ = response_tx.send(response);
                });
            }

            ChainCommand::ConnectWallet => {
                self.tasks.spawn(async move {
                    tracing::info!("Requesting accounts");
                    let response = match wallet.request_account().await {
                        Ok(account) => ChainResponse::WalletConnected(account),
                        Err(e) => failed(op, None, e),
                    };
                    let _ = response_tx.send(response);
                });
            }

            ChainCommand::FetchWaveCount => {
                self.tasks.spawn(async move {
                    let response = match contract.total_waves().await {
                        Ok(count) => ChainResponse::WaveCount(count),
                        Err(e) => failed(op, None, e),
                    };
                    let _ = response_tx.send(response);
                });
            }

            ChainCommand::FetchAllWaves => {
                self.tasks.spawn(async move {
                    let response = match contract.all_waves().await {
                        Ok(waves) => ChainResponse::AllWaves(waves),
                        Err(e) => failed(op, None, e),
                    };
                    let _ = response_tx.send(response);
                });
            }

            ChainCommand::SubmitWave { id, from, message } => {
                self.tasks.spawn(async move {
                    if let Err(e) =
                        submit_wave(&contract, &wallet, id, from, &message, &response_tx).await
                    {
                        let _ = response_tx.send(failed(op, Some(id), e));
                    }
                });
            }

            ChainCommand::Subscribe { id } => {
                self.wanted_subscription = Some(id);
                let subscribed_tx = self.subscribed_tx.clone();
                self.tasks.spawn(async move {
                    tracing::info!(id, address = %contract.address(), "Subscribing to NewWave");
                    let result = contract.subscribe_new_waves().await;
                    let _ = subscribed_tx.send((id, result));
                });
            }

            ChainCommand::Unsubscribe { .. } | ChainCommand::Shutdown => {}
        }
    }

    fn install_subscription(&mut self, id: u64, result: Result<EventSubscription>) {
        match result {
            // Dropping a handle nobody wants any more releases it
            Ok(_) if self.wanted_subscription != Some(id) => {
                tracing::info!(id, "Discarding listener released before it was installed");
            }
            Ok(handle) => {
                self.subscription = Some(ActiveSubscription { id, handle });
                let _ = self.response_tx.send(ChainResponse::Subscribed { id });
            }
            Err(e) => {
                if self.wanted_subscription == Some(id) {
                    self.wanted_subscription = None;
                }
                let _ = self.response_tx.send(failed(ChainOp::Subscribe, Some(id), e));
            }
        }
    }

    fn unsubscribe(&mut self, id: u64) {
        if self.wanted_subscription == Some(id) {
            self.wanted_subscription = None;
        }
        if self.subscription.as_ref().is_some_and(|s| s.id == id) {
            tracing::info!(id, "Removing NewWave listener");
            self.subscription = None;
        }
    }

    fn forward_log(&mut self, id: u64, log: Option<RpcLog>) {
        let Some(log) = log else {
            self.subscription = None;
            if self.wanted_subscription == Some(id) {
                self.wanted_subscription = None;
            }
            let error = anyhow!("NewWave stream ended");
            let _ = self.response_tx.send(failed(ChainOp::Subscribe, Some(id), error));
            return;
        };
        if log.removed {
            tracing::debug!(id, "Skipping removed log");
            return;
        }
        match decode_new_wave(&log) {
            Ok(wave) => {
                let _ = self.response_tx.send(ChainResponse::NewWave { id, wave });
            }
            Err(e) => tracing::error!(id, error = %e, "Undecodable NewWave log"),
        }
    }
}

/// Next log of the active listener; pending forever while there is none
async fn next_log(subscription: &mut Option<ActiveSubscription>) -> Option<(u64, Option<RpcLog>)> {
    match subscription {
        Some(active) => Some((active.id, active.handle.next().await)),
        None => std::future::pending().await,
    }
}

/// Count, send, wait for inclusion, refresh the count
async fn submit_wave<P: WalletProvider>(
    contract: &WavePortalContract<P>,
    wallet: &WalletConnector<P>,
    id: u64,
    from: Option<Address>,
    message: &str,
    response_tx: &mpsc::UnboundedSender<ChainResponse>,
) -> Result<()> {
    let count = contract.total_waves().await?;
    tracing::info!(id, count, "Waves before submit");

    let from = match from {
        Some(account) => account,
        None => wallet
            .authorized_account()
            .await?
            .ok_or_else(|| anyhow!("no authorized account to sign with"))?,
    };

    let hash = contract.wave(from, message).await?;
    let _ = response_tx.send(ChainResponse::WaveSent { id, hash });

    let tx = contract.wait_mined(hash).await?;
    let _ = response_tx.send(ChainResponse::WaveMined { id, tx });

    let count = contract.total_waves().await?;
    let _ = response_tx.send(ChainResponse::WaveCount(count));
    Ok(())
}

fn failed(op: ChainOp, id: Option<u64>, error: anyhow::Error) -> ChainResponse {
    let error = format!("{error:#}");
    tracing::error!(%op, ?id, %error, "Chain call failed");
    ChainResponse::Failed { op, id, error }
}
