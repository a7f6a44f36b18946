//! Command handlers - business logic for processing UI events and chain responses

use crate::app::AppState;
use crate::constants::{NO_PROVIDER_ALERT, WAVE_FAILED_ALERT};
use crate::messages::ui_events::InputMode;
use crate::messages::{ChainCommand, ChainOp, ChainResponse};

impl AppState {
    // ========================
    // Lifecycle
    // ========================

    /// Initial detection, both reads and the NewWave listener
    pub fn mount(&mut self) -> Vec<ChainCommand> {
        self.mounted = true;
        let id = self.next_id();
        self.subscription_id = Some(id);

        vec![
            ChainCommand::CheckConnection,
            ChainCommand::FetchWaveCount,
            ChainCommand::FetchAllWaves,
            ChainCommand::Subscribe { id },
        ]
    }

    /// Release the NewWave listener; later events are dropped
    pub fn unmount(&mut self) -> Option<ChainCommand> {
        self.mounted = false;
        self.listening = false;
        self.subscription_id
            .take()
            .map(|id| ChainCommand::Unsubscribe { id })
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.draft.len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position = self.draft[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.draft.len() {
            self.cursor_position = self.draft[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(self.draft.len());
        }
    }

    pub fn enter_char(&mut self, c: char) {
        if self.cursor_position <= self.draft.len() {
            self.draft.insert(self.cursor_position, c);
            self.cursor_position += c.len_utf8();
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let prev_pos = self.draft[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.draft.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // Wave list scrolling
    // ========================

    pub fn scroll_up(&mut self) {
        self.waves_scroll = self.waves_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.waves_scroll = self.waves_scroll.saturating_add(1);
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    fn raise_alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }

    // ========================
    // Chain actions
    // ========================

    pub fn connect_wallet(&mut self) -> ChainCommand {
        ChainCommand::ConnectWallet
    }

    pub fn refresh(&mut self) -> Vec<ChainCommand> {
        vec![ChainCommand::FetchWaveCount, ChainCommand::FetchAllWaves]
    }

    /// Submit the current draft. Overlapping submits are not prevented.
    pub fn submit_wave(&mut self) -> ChainCommand {
        if self.input_mode == InputMode::Editing {
            self.stop_editing();
        }

        let id = self.next_id();
        self.pending = true;
        tracing::info!(id, message = %self.draft, "Submitting wave");

        ChainCommand::SubmitWave {
            id,
            from: self.current_account,
            message: self.draft.clone(),
        }
    }

    // ========================
    // Chain responses
    // ========================

    pub fn handle_response(&mut self, response: ChainResponse) {
        match response {
            ChainResponse::AccountFound(account) => {
                tracing::info!(%account, "Found an authorized account");
                self.log_info(format!("Found an authorized account {account}"));
                self.current_account = Some(account);
            }
            ChainResponse::NoAuthorizedAccount => {
                tracing::info!("No authorized account found");
                self.log_info("No authorized account found");
            }
            ChainResponse::WalletConnected(account) => {
                tracing::info!(%account, "Connected");
                self.log_info(format!("Connected {account}"));
                self.current_account = Some(account);
            }
            ChainResponse::WaveCount(count) => {
                tracing::info!(count, "Waves");
                self.wave_count = count;
            }
            ChainResponse::AllWaves(waves) => {
                tracing::info!(count = waves.len(), "Loaded wave history");
                self.waves = waves;
            }
            ChainResponse::WaveSent { id, hash } => {
                self.log_info(format!("Mining {hash}"));
                tracing::info!(id, %hash, "Mining");
            }
            ChainResponse::WaveMined { id, tx } => {
                self.pending = false;
                self.log_info(format!("Mined {}", tx.hash));
                tracing::info!(id, hash = %tx.hash, block = ?tx.block_number, "Mined");
            }
            ChainResponse::Subscribed { id } => {
                if self.subscription_id == Some(id) {
                    self.listening = true;
                    self.log_info("Listening for new waves");
                }
            }
            ChainResponse::NewWave { id, wave } => {
                if !self.mounted || self.subscription_id != Some(id) {
                    tracing::debug!(id, "Dropping NewWave from inactive listener");
                    return;
                }
                tracing::info!(from = %wave.address, message = %wave.message, "NewWave");
                self.waves.push(wave);
            }
            ChainResponse::ProviderMissing { op, id } => {
                tracing::error!(%op, ?id, "No wallet provider detected");
                self.log_error(format!("{op}: no wallet provider detected"));
                self.fail(op);
                if op == ChainOp::ConnectWallet {
                    self.raise_alert(NO_PROVIDER_ALERT);
                }
            }
            ChainResponse::Failed { op, id, error } => {
                tracing::error!(%op, ?id, %error, "Chain call failed");
                self.log_error(format!("{op} failed: {error}"));
                self.fail(op);
            }
        }
    }

    /// State rollback shared by every failure path
    fn fail(&mut self, op: ChainOp) {
        match op {
            ChainOp::SubmitWave => {
                self.pending = false;
                self.raise_alert(WAVE_FAILED_ALERT);
            }
            ChainOp::Subscribe => self.listening = false,
            _ => {}
        }
    }
}
