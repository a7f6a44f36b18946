use crate::constants::{
    DEFAULT_CONTRACT_ADDRESS, DEFAULT_GAS_LIMIT, DEFAULT_RECEIPT_POLL_MS, DEFAULT_RPC_URL,
    DEFAULT_WS_URL,
};
use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.yaml";

/// Chain endpoints and contract coordinates.
///
/// Every field is optional in the file; missing fields fall back to the
/// compiled-in defaults. An empty `rpc_url` means no wallet provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub ws_url: String,
    pub contract_address: Address,
    pub gas_limit: u64,
    pub receipt_poll_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            rpc_url: String::from(DEFAULT_RPC_URL),
            ws_url: String::from(DEFAULT_WS_URL),
            contract_address: DEFAULT_CONTRACT_ADDRESS.parse().unwrap_or(Address::ZERO),
            gas_limit: DEFAULT_GAS_LIMIT,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }
}

impl ChainConfig {
    /// Default config directory (`~/.waveportal`)
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".waveportal")
    }

    /// Load from the default location, falling back to defaults on any problem
    pub fn load() -> Self {
        let path = Self::config_dir().join(CONFIG_FILE);
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_yaml::from_str::<ChainConfig>(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(1))
    }

    /// Whether a wallet provider endpoint is configured at all
    pub fn has_provider(&self) -> bool {
        !self.rpc_url.trim().is_empty()
    }
}
