//! Chain layer - wallet provider access and the WavePortal contract proxy
//!
//! The Chain actor receives contract commands and sends back responses.

pub mod actor;
pub mod contract;
pub mod rpc;
pub mod subscription;
pub mod wallet;

#[cfg(test)]
pub mod mock;

pub use actor::ChainActor;
pub use contract::WavePortalContract;
pub use subscription::EventSubscription;
pub use wallet::{JsonRpcProvider, WalletConnector, WalletProvider};
