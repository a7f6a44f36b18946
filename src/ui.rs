use alloy_primitives::Address;
use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use ratatui::{prelude::*, widgets::*};

use crate::models::{ActivityLevel, Wave};

/// Renders a text input field
pub fn render_input<'a>(content: &'a str, title: &'a str, is_editing: bool) -> Paragraph<'a> {
    let style = if is_editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);

    Paragraph::new(content).block(block)
}

/// `0x3B75…65c6` style abbreviation of an address
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    if full.len() <= 12 {
        return full;
    }
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

/// Terminal column of the cursor inside a bordered input at `area`
pub fn cursor_column(area: Rect, draft: &str, cursor_position: usize) -> u16 {
    let typed = draft.get(..cursor_position).map_or(0, |s| s.chars().count());
    let max_x = area.x.saturating_add(area.width.saturating_sub(2));
    area.x
        .saturating_add(u16::try_from(typed).unwrap_or(u16::MAX))
        .saturating_add(1)
        .min(max_x)
}

/// Wave timestamp as shown in the list, `Thu Jan 01 1970 00:00:00 GMT+0000`
pub fn format_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    timestamp.format("%a %b %d %Y %H:%M:%S GMT%z").to_string()
}

/// Three lines per wave: address, time, message
pub fn wave_lines(wave: &Wave) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("Address: ", Style::default().fg(Color::DarkGray)),
            Span::styled(wave.address.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Time:    ", Style::default().fg(Color::DarkGray)),
            Span::raw(format_timestamp(&wave.timestamp.with_timezone(&Local))),
        ]),
        Line::from(vec![
            Span::styled("Message: ", Style::default().fg(Color::DarkGray)),
            Span::styled(wave.message.clone(), Style::default().fg(Color::White).bold()),
        ]),
        Line::from(""),
    ]
}

/// Activity line color
pub fn activity_color(level: ActivityLevel) -> Color {
    match level {
        ActivityLevel::Info => Color::Green,
        ActivityLevel::Error => Color::Red,
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
