//! # WavePortal TUI
//!
//! A terminal front-end for the WavePortal smart contract.
//!
//! ## Features
//! - Wallet connection through an Ethereum JSON-RPC provider
//! - Wave count and full wave history
//! - Submit a wave with a fixed gas ceiling and wait for it to be mined
//! - Live `NewWave` events over a WebSocket log subscription
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (view controller state)
//! - Chain Layer (Tokio runtime)

pub mod app;
pub mod chain;
pub mod config;
pub mod constants;
pub mod messages;
pub mod models;
pub mod ui;

// Re-export commonly used types
pub use models::Wave;
pub use config::ChainConfig;
pub use messages::{ChainCommand, ChainResponse, RenderState, UiEvent};
pub use app::{AppActor, AppState};
pub use chain::{ChainActor, JsonRpcProvider, WalletConnector, WalletProvider};
