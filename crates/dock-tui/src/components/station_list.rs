//! StationList component — the dock overview, one row per station.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        band_color, style_focused_border, style_secondary, style_selected,
        style_selected_focused, style_unfocused_border, C_PRIMARY,
    },
};

pub struct StationList {
    selected: usize,
    list_state: ListState,
}

impl StationList {
    pub fn new() -> Self {
        Self {
            selected: 0,
            list_state: ListState::default(),
        }
    }

    pub fn selected_station_id(&self, state: &AppState) -> Option<i64> {
        state.stations.get(self.selected).map(|s| s.id)
    }

    fn clamp_selection(&mut self, state: &AppState) {
        if state.stations.is_empty() {
            self.selected = 0;
        } else if self.selected >= state.stations.len() {
            self.selected = state.stations.len() - 1;
        }
    }

    // A fixed-width bar showing how full the dock is, colored by band.
    fn fill_bar(pct: i64, width: usize) -> String {
        let filled = ((pct.clamp(0, 100) as usize) * width) / 100;
        let mut bar = String::with_capacity(width);
        for i in 0..width {
            bar.push(if i < filled { '█' } else { '░' });
        }
        bar
    }
}

impl Component for StationList {
    fn id(&self) -> ComponentId {
        ComponentId::StationList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        self.clamp_selection(state);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                vec![Action::Noop]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < state.stations.len() {
                    self.selected += 1;
                }
                vec![Action::Noop]
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.selected = 0;
                vec![Action::Noop]
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.selected = state.stations.len().saturating_sub(1);
                vec![Action::Noop]
            }
            KeyCode::Enter => match self.selected_station_id(state) {
                Some(id) => vec![Action::OpenStation(id)],
                None => vec![],
            },
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if matches!(action, Action::RefreshStations) {
            self.clamp_selection(state);
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let border_style = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" Docks ({}) ", state.stations.len()));

        let items: Vec<ListItem> = state
            .stations
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let row_style = if idx == self.selected {
                    if focused {
                        style_selected_focused()
                    } else {
                        style_selected()
                    }
                } else {
                    Style::default()
                };
                let line = Line::from(vec![
                    Span::styled(format!("{:<28}", s.name), Style::default().fg(C_PRIMARY)),
                    Span::styled(
                        Self::fill_bar(s.pct_full, 12),
                        Style::default().fg(band_color(s.status)),
                    ),
                    Span::styled(
                        format!(" {:>3}% ", s.pct_full),
                        Style::default().fg(band_color(s.status)),
                    ),
                    Span::styled(
                        format!("{} bikes / {} free", s.free_bikes, s.empty_slots),
                        style_secondary(),
                    ),
                ]);
                ListItem::new(line).style(row_style)
            })
            .collect();

        self.list_state.select(if state.stations.is_empty() {
            None
        } else {
            Some(self.selected)
        });

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}
