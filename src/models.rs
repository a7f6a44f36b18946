use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, TimeZone, Utc};

/// One wave as shown in the UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wave {
    pub address: Address,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl Wave {
    pub fn new(address: Address, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Wave {
            address,
            timestamp,
            message: message.into(),
        }
    }

    /// Build a wave from the raw on-chain fields (timestamp in seconds)
    pub fn from_chain(address: Address, timestamp: U256, message: String) -> Self {
        Wave {
            address,
            timestamp: timestamp_from_secs(timestamp),
            message,
        }
    }
}

/// Convert an on-chain `uint256` seconds value into a UTC timestamp.
///
/// Values outside chrono's range collapse to the Unix epoch.
pub fn timestamp_from_secs(secs: U256) -> DateTime<Utc> {
    u64::try_from(secs)
        .ok()
        .and_then(|s| i64::try_from(s).ok())
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// A transaction that made it into a block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinedTx {
    pub hash: B256,
    pub block_number: Option<u64>,
}

/// Severity of an activity log line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityLevel {
    Info,
    Error,
}

/// A line in the activity log
#[derive(Clone, Debug)]
pub struct ActivityEntry {
    pub level: ActivityLevel,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn info(content: impl Into<String>) -> Self {
        ActivityEntry {
            level: ActivityLevel::Info,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        ActivityEntry {
            level: ActivityLevel::Error,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
