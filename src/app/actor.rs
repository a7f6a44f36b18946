//! App actor - message loop processing UI events and chain responses

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{ChainCommand, ChainResponse, RenderState, UiEvent};

/// App actor that processes UI events and chain responses
pub struct AppActor {
    state: AppState,
    chain_tx: mpsc::UnboundedSender<ChainCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        provider_available: bool,
        chain_tx: mpsc::UnboundedSender<ChainCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state: AppState::new(provider_available),
            chain_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut chain_rx: mpsc::UnboundedReceiver<ChainResponse>,
    ) {
        for cmd in self.state.mount() {
            self.send(cmd);
        }
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = chain_rx.recv() => {
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }

        // Unmount: release the listener before the chain actor goes away
        if let Some(cmd) = self.state.unmount() {
            self.send(cmd);
        }
        self.send(ChainCommand::Shutdown);
    }

    fn send(&self, cmd: ChainCommand) {
        if self.chain_tx.send(cmd).is_err() {
            tracing::error!("Chain actor is gone");
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Chain actions
            UiEvent::SubmitWave => {
                let cmd = self.state.submit_wave();
                self.send(cmd);
            }
            UiEvent::ConnectWallet => {
                let cmd = self.state.connect_wallet();
                self.send(cmd);
            }
            UiEvent::Refresh => {
                for cmd in self.state.refresh() {
                    self.send(cmd);
                }
            }

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),
            UiEvent::DismissAlert => self.state.dismiss_alert(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ChainOp;

    #[tokio::test]
    async fn test_mount_and_unmount_commands() {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (chain_tx, mut chain_cmd_rx) = mpsc::unbounded_channel();
        let (_chain_resp_tx, chain_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(true, chain_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, chain_rx));

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();

        let mut commands = Vec::new();
        while let Ok(cmd) = chain_cmd_rx.try_recv() {
            commands.push(cmd);
        }
        assert!(matches!(commands[0], ChainCommand::CheckConnection));
        assert!(matches!(commands[3], ChainCommand::Subscribe { .. }));
        assert!(matches!(commands[4], ChainCommand::Unsubscribe { .. }));
        assert!(matches!(commands[5], ChainCommand::Shutdown));
        assert!(render_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_submit_failure_renders_alert() {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (chain_tx, mut chain_cmd_rx) = mpsc::unbounded_channel();
        let (chain_resp_tx, chain_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(true, chain_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, chain_rx));

        ui_tx.send(UiEvent::SubmitWave).unwrap();
        let id = loop {
            match chain_cmd_rx.recv().await.unwrap() {
                ChainCommand::SubmitWave { id, .. } => break id,
                _ => continue,
            }
        };

        chain_resp_tx
            .send(ChainResponse::Failed {
                op: ChainOp::SubmitWave,
                id: Some(id),
                error: String::from("boom"),
            })
            .unwrap();

        let rendered = loop {
            let state = render_rx.recv().await.unwrap();
            if state.alert.is_some() {
                break state;
            }
        };
        assert!(!rendered.pending);

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
    }
}
