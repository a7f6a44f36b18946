//! App state - pure data structure with no I/O logic

use std::collections::VecDeque;

use alloy_primitives::Address;

use crate::constants::MAX_ACTIVITY;
use crate::messages::ui_events::InputMode;
use crate::messages::RenderState;
use crate::models::{ActivityEntry, Wave};

/// Main application state - pure data, no I/O
pub struct AppState {
    // Wallet
    pub current_account: Option<Address>,
    pub provider_available: bool,

    // Contract mirror
    pub wave_count: u64,
    pub waves: Vec<Wave>,

    // Message draft
    pub draft: String,
    pub cursor_position: usize,
    pub input_mode: InputMode,

    // Submit tracking (idle -> pending -> idle)
    pub pending: bool,
    pub next_request_id: u64,

    // Live NewWave listener; events from any other id are ignored
    pub subscription_id: Option<u64>,
    pub listening: bool,
    pub mounted: bool,

    // UI state
    pub waves_scroll: u16,
    pub activity: VecDeque<ActivityEntry>,

    // Popups
    pub show_help: bool,
    pub alert: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AppState {
    pub fn new(provider_available: bool) -> Self {
        AppState {
            current_account: None,
            provider_available,
            wave_count: 0,
            waves: Vec::new(),
            draft: String::new(),
            cursor_position: 0,
            input_mode: InputMode::Normal,
            pending: false,
            next_request_id: 1,
            subscription_id: None,
            listening: false,
            mounted: false,
            waves_scroll: 0,
            activity: VecDeque::with_capacity(MAX_ACTIVITY),
            show_help: false,
            alert: None,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn log_info(&mut self, content: impl Into<String>) {
        self.push_activity(ActivityEntry::info(content));
    }

    pub fn log_error(&mut self, content: impl Into<String>) {
        self.push_activity(ActivityEntry::error(content));
    }

    /// Newest first, dropping the oldest past the cap
    fn push_activity(&mut self, entry: ActivityEntry) {
        if self.activity.len() >= MAX_ACTIVITY {
            self.activity.pop_back();
        }
        self.activity.push_front(entry);
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        RenderState {
            current_account: self.current_account,
            provider_available: self.provider_available,
            wave_count: self.wave_count,
            waves: self.waves.clone(),
            pending: self.pending,
            listening: self.listening,
            draft: self.draft.clone(),
            cursor_position: self.cursor_position,
            input_mode: self.input_mode,
            waves_scroll: self.waves_scroll,
            activity: self.activity.iter().cloned().collect(),
            show_help: self.show_help,
            alert: self.alert.clone(),
        }
    }
}
