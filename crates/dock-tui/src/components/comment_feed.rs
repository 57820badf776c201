//! CommentFeed component — the live discussion pane on a station page.
//!
//! Renders the reconciled `FeedView` tree and owns the composer input.
//! Sends come out as `Action::SendCommand`; the App is the one talking to
//! the socket, so a refused send surfaces as a status line, not a panic.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    feed::FeedView,
    theme::{
        style_focused_border, style_muted, style_selected, style_selected_focused,
        style_unfocused_border, C_AUTHOR, C_OWN_REPLY, C_PRIMARY, C_TIMESTAMP,
    },
    widgets::text_entry::{EntryAction, TextEntry},
};

/// A flattened row of the comment tree, addressed by indices into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedRow {
    Comment(usize),
    Reply(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeMode {
    Comment,
    /// Replying to the comment with this id.
    Reply(i64),
}

pub struct CommentFeed {
    selected: usize,
    list_state: ListState,
    entry: TextEntry,
    compose: Option<ComposeMode>,
}

impl CommentFeed {
    pub fn new() -> Self {
        Self {
            selected: 0,
            list_state: ListState::default(),
            entry: TextEntry::default(),
            compose: None,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.compose.is_some()
    }

    fn rows(view: &FeedView) -> Vec<FeedRow> {
        let mut rows = Vec::new();
        for (ci, comment) in view.comments().iter().enumerate() {
            rows.push(FeedRow::Comment(ci));
            for ri in 0..comment.replies.len() {
                rows.push(FeedRow::Reply(ci, ri));
            }
        }
        rows
    }

    fn selected_row(&self, view: &FeedView) -> Option<FeedRow> {
        Self::rows(view).get(self.selected).copied()
    }

    /// The comment id a reply should target: the selected comment itself,
    /// or the parent of the selected reply.
    fn reply_target(&self, view: &FeedView) -> Option<i64> {
        match self.selected_row(view)? {
            FeedRow::Comment(ci) => view.comments().get(ci).map(|c| c.id),
            FeedRow::Reply(ci, _) => view.comments().get(ci).map(|c| c.id),
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent, view: &FeedView) -> Vec<Action> {
        let mode = match self.compose {
            Some(m) => m,
            None => return vec![],
        };
        match self.entry.handle_key(key) {
            EntryAction::Submitted(text) => {
                self.compose = None;
                let cmd = match mode {
                    ComposeMode::Comment => view.compose_comment(&text),
                    ComposeMode::Reply(parent) => view.compose_reply(parent, &text),
                };
                match cmd {
                    Some(cmd) => vec![Action::SendCommand(cmd)],
                    // Whitespace-only input: nothing goes out, quietly.
                    None => vec![],
                }
            }
            EntryAction::Cancelled => {
                self.compose = None;
                vec![]
            }
            EntryAction::None => vec![Action::Noop],
        }
    }
}

impl Component for CommentFeed {
    fn id(&self) -> ComponentId {
        ComponentId::CommentFeed
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        let Some(view) = &state.feed else {
            return vec![];
        };

        if self.compose.is_some() {
            return self.handle_compose_key(key, view);
        }

        let row_count = Self::rows(view).len();
        if self.selected >= row_count {
            self.selected = row_count.saturating_sub(1);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                vec![Action::Noop]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < row_count {
                    self.selected += 1;
                }
                vec![Action::Noop]
            }
            KeyCode::Char('c') => {
                self.compose = Some(ComposeMode::Comment);
                self.entry.activate("comment");
                vec![Action::Noop]
            }
            KeyCode::Char('r') => match self.reply_target(view) {
                Some(parent) => {
                    self.compose = Some(ComposeMode::Reply(parent));
                    self.entry.activate("reply");
                    vec![Action::Noop]
                }
                None => vec![Action::Status("no comment to reply to".to_string())],
            },
            KeyCode::Char('d') => match self.selected_row(view) {
                Some(FeedRow::Reply(ci, ri)) => {
                    let reply = &view.comments()[ci].replies[ri];
                    if reply.can_delete {
                        vec![Action::SendCommand(view.compose_delete(reply.id))]
                    } else {
                        vec![Action::Status("you can only delete your own replies".to_string())]
                    }
                }
                _ => vec![],
            },
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        // Leaving a station page resets the composer and cursor.
        if matches!(action, Action::OpenStation(_)) {
            self.compose = None;
            self.entry.deactivate();
            self.selected = 0;
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
            .title(" Comments ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows_area = if self.compose.is_some() {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(inner);
            self.entry.draw(frame, parts[1]);
            parts[0]
        } else {
            inner
        };

        let Some(view) = &state.feed else {
            frame.render_widget(
                Paragraph::new("open a station to join the discussion").style(style_muted()),
                rows_area,
            );
            return;
        };

        let rows = Self::rows(view);
        if rows.is_empty() {
            frame.render_widget(
                Paragraph::new("no comments yet — press c to start").style(style_muted()),
                rows_area,
            );
            return;
        }
        if self.selected >= rows.len() {
            self.selected = rows.len() - 1;
        }

        let items: Vec<ListItem> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let row_style = if idx == self.selected {
                    if focused {
                        style_selected_focused()
                    } else {
                        style_selected()
                    }
                } else {
                    Style::default()
                };
                let line = match row {
                    FeedRow::Comment(ci) => {
                        let c = &view.comments()[*ci];
                        Line::from(vec![
                            Span::styled(c.author.clone(), Style::default().fg(C_AUTHOR)),
                            Span::styled(format!("  {}", c.created), Style::default().fg(C_TIMESTAMP)),
                            Span::styled(format!("  {}", c.content), Style::default().fg(C_PRIMARY)),
                        ])
                    }
                    FeedRow::Reply(ci, ri) => {
                        let r = &view.comments()[*ci].replies[*ri];
                        let author_color = if r.can_delete { C_OWN_REPLY } else { C_AUTHOR };
                        Line::from(vec![
                            Span::raw("    ↳ "),
                            Span::styled(r.author.clone(), Style::default().fg(author_color)),
                            Span::styled(format!("  {}", r.created), Style::default().fg(C_TIMESTAMP)),
                            Span::styled(format!("  {}", r.content), Style::default().fg(C_PRIMARY)),
                        ])
                    }
                };
                ListItem::new(line).style(row_style)
            })
            .collect();

        self.list_state.select(Some(self.selected));
        let list = List::new(items);
        frame.render_stateful_widget(list, rows_area, &mut self.list_state);
    }
}
