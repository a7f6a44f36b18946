//! WavePortal TUI - wave at a smart contract from the terminal
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - view controller state processing events
//! - Chain Layer (Tokio) - async JSON-RPC calls and the NewWave listener

use std::io;
use std::time::Duration;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use tokio::sync::mpsc;

use waveportal_tui::app::AppActor;
use waveportal_tui::chain::{ChainActor, WalletConnector};
use waveportal_tui::config::ChainConfig;
use waveportal_tui::constants::APP_NAME;
use waveportal_tui::messages::ui_events::{key_to_ui_event, InputMode};
use waveportal_tui::messages::{ChainCommand, ChainResponse, RenderState, UiEvent};
use waveportal_tui::ui::{
    activity_color, centered_rect, cursor_column, render_input, short_address, wave_lines,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", "waveportal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = ChainConfig::load();
    tracing::info!(?config, "Starting {}", APP_NAME);

    let wallet = WalletConnector::detect(&config);
    let provider_available = wallet.is_available();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (chain_cmd_tx, chain_cmd_rx) = mpsc::unbounded_channel::<ChainCommand>();
    let (chain_resp_tx, chain_resp_rx) = mpsc::unbounded_channel::<ChainResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn chain actor
    let chain_actor = ChainActor::new(wallet, &config, chain_resp_tx);
    let chain_handle = tokio::spawn(chain_actor.run(chain_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(provider_available, chain_cmd_tx, render_tx);
    let app_handle = tokio::spawn(app_actor.run(ui_rx, chain_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    // Let the app unmount and the chain actor drop the listener
    let _ = app_handle.await;
    let _ = chain_handle.await;

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.input_mode,
                    current_state.show_help,
                    current_state.alert.is_some(),
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let pending_height = if state.pending { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),              // Header + bio
            Constraint::Length(pending_height), // Pending banner
            Constraint::Length(3),              // Message input
            Constraint::Min(5),                 // Waves
            Constraint::Length(6),              // Activity
            Constraint::Length(1),              // Status bar
        ])
        .split(area);

    draw_header(f, state, chunks[0]);
    if state.pending {
        let banner = Paragraph::new(" Processing transaction, may take up to 20 mins ...")
            .style(Style::default().fg(Color::Yellow).bold());
        f.render_widget(banner, chunks[1]);
    }
    draw_message_input(f, state, chunks[2]);
    draw_waves(f, state, chunks[3]);
    draw_activity(f, state, chunks[4]);
    draw_status_bar(f, state, chunks[5]);

    // Popups
    if state.show_help {
        draw_help_popup(f, area);
    }

    if let Some(alert) = &state.alert {
        draw_alert_popup(f, alert, area);
    }
}

fn draw_header(f: &mut Frame, state: &RenderState, area: Rect) {
    let account = match (&state.current_account, state.provider_available) {
        (Some(account), _) => Span::styled(
            format!(" {} ", short_address(account)),
            Style::default().fg(Color::Black).bg(Color::Green).bold(),
        ),
        (None, true) => Span::styled(
            " Press 'c' to Connect Wallet ",
            Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        ),
        (None, false) => Span::styled(
            " No wallet provider ",
            Style::default().fg(Color::White).bg(Color::Red).bold(),
        ),
    };

    let listening = if state.listening {
        Span::styled(" [live]", Style::default().fg(Color::Green))
    } else {
        Span::raw("")
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("👋 Hey there! ", Style::default().bold()),
            account,
            listening,
        ]),
        Line::from(Span::styled(
            "I am Rick and I worked on different projects so that's pretty cool right? \
             Connect your Ethereum wallet and wave at me!",
            Style::default().fg(Color::Gray),
        )),
        Line::from(vec![
            Span::raw("Number of waves: "),
            Span::styled(state.wave_count.to_string(), Style::default().fg(Color::Yellow).bold()),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn draw_message_input(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_editing = state.input_mode == InputMode::Editing;
    let input = render_input(&state.draft, " Message (e:edit  s:wave at me) ", is_editing);
    f.render_widget(input, area);

    if is_editing {
        let cursor_x = cursor_column(area, &state.draft, state.cursor_position);
        f.set_cursor_position(Position::new(cursor_x, area.y.saturating_add(1)));
    }
}

fn draw_waves(f: &mut Frame, state: &RenderState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Waves ({}) ↑/↓ scroll ", state.waves.len()));

    let mut lines: Vec<Line> = state.waves.iter().flat_map(wave_lines).collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No waves yet. Be the first!",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let waves = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.waves_scroll, 0));
    f.render_widget(waves, area);
}

fn draw_activity(f: &mut Frame, state: &RenderState, area: Rect) {
    let items: Vec<ListItem> = state
        .activity
        .iter()
        .map(|entry| {
            ListItem::new(format!(
                "{} {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.content
            ))
            .style(Style::default().fg(activity_color(entry.level)))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Activity "));
    f.render_widget(list, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let status = if state.pending {
        " Mining... | ?:help | q:quit "
    } else if state.input_mode == InputMode::Editing {
        " ESC:stop editing | arrows:move | Enter:wave "
    } else {
        " e:edit | s:wave | c:connect | r:refresh | ?:help | q:quit "
    };

    let bar = Paragraph::new(status)
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);

    let help_text = r#"
 WAVEPORTAL TUI - Keyboard Shortcuts

 MESSAGE
   e                  Edit message
   Esc                Stop editing
   s / Enter          Wave at me

 WALLET
   c                  Connect wallet
   r                  Refresh count and waves

 WAVES
   ↑ / ↓              Scroll

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_alert_popup(f: &mut Frame, alert: &str, area: Rect) {
    let popup_area = centered_rect(50, 20, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Alert (any key to dismiss) ")
        .style(Style::default().bg(Color::Black));

    let text = Paragraph::new(format!("\n{alert}"))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}
