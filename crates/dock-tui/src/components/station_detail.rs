//! StationDetail component — fill gauge plus availability trend chart.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph},
    Frame,
};

use dock_proto::station::{FillBand, Granularity};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        band_color, style_focused_border, style_muted, style_secondary,
        style_unfocused_border, C_ACCENT,
    },
};

pub struct StationDetail;

impl StationDetail {
    pub fn new() -> Self {
        Self
    }
}

impl Component for StationDetail {
    fn id(&self) -> ComponentId {
        ComponentId::StationDetail
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let border_style = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let title = state
            .open_station_name()
            .map(|n| format!(" {} ", n))
            .unwrap_or_else(|| " Station ".to_string());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(detail) = &state.detail else {
            frame.render_widget(
                Paragraph::new("loading…").style(style_muted()),
                inner,
            );
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(4),
            ])
            .split(inner);

        let counts = Paragraph::new(format!(
            "{} bikes, {} free slots of {}",
            detail.free_bikes, detail.empty_slots, detail.slots
        ))
        .style(style_secondary());
        frame.render_widget(counts, rows[0]);

        let band = FillBand::from_pct(detail.pct_full);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(band_color(band)))
            .ratio((detail.pct_full.clamp(0, 100) as f64) / 100.0)
            .label(format!("{}% full ({})", detail.pct_full, band.label()));
        frame.render_widget(gauge, rows[1]);

        let Some(trend) = &state.trend else {
            frame.render_widget(
                Paragraph::new("no trend data yet").style(style_muted()),
                rows[2],
            );
            return;
        };

        let points: Vec<(f64, f64)> = trend
            .series
            .iter()
            .map(|p| (p.ts.timestamp() as f64, p.free))
            .collect();
        if points.is_empty() {
            frame.render_widget(
                Paragraph::new("no trend data yet").style(style_muted()),
                rows[2],
            );
            return;
        }

        let x_min = points.first().map(|p| p.0).unwrap_or(0.0);
        let x_max = points.last().map(|p| p.0).unwrap_or(1.0);
        let y_max = points
            .iter()
            .map(|p| p.1)
            .fold(1.0_f64, f64::max)
            .ceil();

        let time_fmt = match trend.granularity {
            Granularity::Hour => "%H:%M",
            Granularity::Day => "%m-%d",
        };
        let x_labels: Vec<Span> = [trend.series.first(), trend.series.last()]
            .into_iter()
            .flatten()
            .map(|p| Span::styled(p.ts.format(time_fmt).to_string(), style_muted()))
            .collect();

        let dataset = Dataset::default()
            .name(match trend.granularity {
                Granularity::Hour => "avg bikes / hour",
                Granularity::Day => "avg bikes / day",
            })
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_ACCENT))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .x_axis(
                Axis::default()
                    .style(style_muted())
                    .bounds([x_min, x_max.max(x_min + 1.0)])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(style_muted())
                    .bounds([0.0, y_max])
                    .labels(vec![
                        Span::styled("0", style_muted()),
                        Span::styled(format!("{}", y_max as i64), style_muted()),
                    ]),
            );
        frame.render_widget(chart, rows[2]);
    }
}
