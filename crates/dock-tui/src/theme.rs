//! Color palette and style constants for the dock TUI.

use dock_proto::station::FillBand;
use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_ACCENT: Color = Color::Rgb(95, 175, 255);
pub const C_CONNECTED: Color = Color::Rgb(80, 200, 120);
pub const C_CONNECTING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_INPUT_BG: Color = Color::Rgb(20, 20, 32);
pub const C_INPUT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_AUTHOR: Color = Color::Rgb(80, 140, 200);
pub const C_TIMESTAMP: Color = Color::Rgb(100, 160, 130);
pub const C_OWN_REPLY: Color = Color::Rgb(180, 120, 220);

// Fill bands match the dashboard's traffic-light coding.
pub const C_BAND_BAD: Color = Color::Rgb(255, 95, 95);
pub const C_BAND_LOW: Color = Color::Rgb(255, 184, 80);
pub const C_BAND_OK: Color = Color::Rgb(80, 200, 120);
pub const C_BAND_HIGH: Color = Color::Rgb(255, 210, 50);

pub fn band_color(band: FillBand) -> Color {
    match band {
        FillBand::BadEmpty | FillBand::BadFull => C_BAND_BAD,
        FillBand::Low => C_BAND_LOW,
        FillBand::Ok => C_BAND_OK,
        FillBand::High => C_BAND_HIGH,
    }
}

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_selected() -> Style {
    Style::default().bg(C_SELECTION_BG).fg(C_PRIMARY)
}

pub fn style_selected_focused() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
