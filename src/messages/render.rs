//! Render state - data structure sent from App layer to UI for rendering

use alloy_primitives::Address;

use crate::messages::ui_events::InputMode;
use crate::models::{ActivityEntry, Wave};

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Wallet
    pub current_account: Option<Address>,
    pub provider_available: bool,

    // Contract state
    pub wave_count: u64,
    pub waves: Vec<Wave>,
    pub pending: bool,
    pub listening: bool,

    // Message input
    pub draft: String,
    pub cursor_position: usize,
    pub input_mode: InputMode,

    // Wave list
    pub waves_scroll: u16,

    // Activity log (newest first)
    pub activity: Vec<ActivityEntry>,

    // Popups
    pub show_help: bool,
    pub alert: Option<String>,
}
