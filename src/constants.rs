//! Application constants
//!
//! Centralized location for the contract coordinates and configuration defaults.

/// Deployed WavePortal contract address
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x3B7579ab94b968499218A5b95E0A9E696A8565c6";

/// Gas ceiling authorized for a single `wave` transaction
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// Default JSON-RPC endpoint for requests
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default WebSocket endpoint for event subscriptions
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8545";

/// How often a pending transaction is polled for its receipt
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Maximum number of lines kept in the activity log
pub const MAX_ACTIVITY: usize = 50;

/// Alert shown when a wave could not be submitted
pub const WAVE_FAILED_ALERT: &str = "Something went wrong, please try again";

/// Alert shown when connecting without any wallet provider
pub const NO_PROVIDER_ALERT: &str = "Please install a wallet provider";

/// Application name
pub const APP_NAME: &str = "WavePortal TUI";
