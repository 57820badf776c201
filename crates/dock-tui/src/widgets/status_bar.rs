//! Status bar — bottom lines with connection state, last status, and keys.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::connection::ConnectionState;
use crate::theme::{
    C_CONNECTED, C_CONNECTING, C_ERROR, C_MUTED, C_SECONDARY, C_SEPARATOR,
};

fn connection_span(connection: ConnectionState) -> Span<'static> {
    match connection {
        ConnectionState::Open => Span::styled("●", Style::default().fg(C_CONNECTED)),
        ConnectionState::Connecting => Span::styled("◐", Style::default().fg(C_CONNECTING)),
        ConnectionState::Disconnected => Span::styled("○", Style::default().fg(C_MUTED)),
        ConnectionState::ClosedWithError => Span::styled("○", Style::default().fg(C_ERROR)),
    }
}

/// Draw the status line: connection bulb, feed state label, last status text.
pub fn draw_status_bar(
    frame: &mut Frame,
    area: Rect,
    connection: ConnectionState,
    status: Option<&str>,
) {
    let line = Line::from(vec![
        connection_span(connection),
        Span::styled(
            format!(" {} ", connection.label()),
            Style::default().fg(C_SECONDARY),
        ),
        Span::styled(status.unwrap_or(""), Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, on_detail: bool, composing: bool) {
    let keys = if composing {
        " type your message  Enter send  Esc cancel"
    } else if on_detail {
        " ↑↓/jk select  c comment  r reply  d delete reply  Esc back  R reconnect  Tab panes  q quit"
    } else {
        " ↑↓/jk select  Enter open station  g/G first/last  R reconnect  q quit"
    };

    let line = Line::from(vec![
        Span::styled(
            if on_detail { " STATION " } else { " DOCKS " },
            Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
