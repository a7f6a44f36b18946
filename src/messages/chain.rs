//! Chain messages - communication between App and Chain layers

use std::fmt;

use alloy_primitives::{Address, B256};

use crate::models::{MinedTx, Wave};

/// Commands sent from App layer to Chain layer
#[derive(Debug, Clone)]
pub enum ChainCommand {
    /// Look for an already-authorized account (mount-time detection)
    CheckConnection,
    /// Ask the wallet to authorize an account
    ConnectWallet,
    /// Read the contract's running total
    FetchWaveCount,
    /// Read the full wave history
    FetchAllWaves,
    /// Submit a wave and wait for it to be mined
    SubmitWave {
        id: u64,
        from: Option<Address>,
        message: String,
    },
    /// Install the `NewWave` listener
    Subscribe { id: u64 },
    /// Tear the `NewWave` listener down
    Unsubscribe { id: u64 },
    /// Shutdown the chain actor
    Shutdown,
}

/// Which operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    CheckConnection,
    ConnectWallet,
    FetchWaveCount,
    FetchAllWaves,
    SubmitWave,
    Subscribe,
}

impl ChainOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainOp::CheckConnection => "check connection",
            ChainOp::ConnectWallet => "connect wallet",
            ChainOp::FetchWaveCount => "fetch wave count",
            ChainOp::FetchAllWaves => "fetch waves",
            ChainOp::SubmitWave => "wave",
            ChainOp::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for ChainOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Responses sent from Chain layer to App layer
#[derive(Debug, Clone)]
pub enum ChainResponse {
    /// Mount-time detection found an authorized account
    AccountFound(Address),
    /// Provider present but nothing authorized yet
    NoAuthorizedAccount,
    /// Explicit connect succeeded
    WalletConnected(Address),
    /// Running total read from the contract
    WaveCount(u64),
    /// Full history read from the contract
    AllWaves(Vec<Wave>),
    /// Wave transaction broadcast, now mining
    WaveSent { id: u64, hash: B256 },
    /// Wave transaction included in a block
    WaveMined { id: u64, tx: MinedTx },
    /// `NewWave` listener installed
    Subscribed { id: u64 },
    /// `NewWave` event delivered by the listener `id`
    NewWave { id: u64, wave: Wave },
    /// No wallet provider to run `op` against
    ProviderMissing { op: ChainOp, id: Option<u64> },
    /// `op` failed
    Failed {
        op: ChainOp,
        id: Option<u64>,
        error: String,
    },
}
