//! TextEntry — wraps tui-input for the comment/reply composer.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_INPUT_BG, C_INPUT_FG, C_MUTED};

pub enum EntryAction {
    /// Enter pressed; the accumulated text (submitter decides what to do
    /// with whitespace-only input).
    Submitted(String),
    Cancelled,
    None,
}

pub struct TextEntry {
    input: Input,
    active: bool,
    prompt: String,
}

impl TextEntry {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prompt: prompt.into(),
        }
    }

    pub fn activate(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.input = Input::default();
    }

    /// Handle a key event. Returns what happened.
    pub fn handle_key(&mut self, key: KeyEvent) -> EntryAction {
        match key.code {
            KeyCode::Esc => {
                self.deactivate();
                EntryAction::Cancelled
            }
            KeyCode::Enter => {
                let text = self.input.value().to_string();
                self.deactivate();
                EntryAction::Submitted(text)
            }
            _ => {
                self.input
                    .handle_event(&ratatui::crossterm::event::Event::Key(key));
                EntryAction::None
            }
        }
    }

    /// Render the entry bar into `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prompt_width = self.prompt.chars().count() as u16 + 2;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prompt_width + 2) as usize);
        let value = self.input.value();

        let line = Line::from(vec![
            Span::styled(format!("{}> ", self.prompt), Style::default().fg(C_MUTED)),
            Span::styled(
                value[scroll..].to_string(),
                Style::default().fg(C_INPUT_FG),
            ),
        ]);
        let paragraph = Paragraph::new(line).style(Style::default().bg(C_INPUT_BG));
        frame.render_widget(paragraph, area);

        if self.active {
            let cursor_x = area.x + prompt_width + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
        }
    }
}

impl Default for TextEntry {
    fn default() -> Self {
        Self::new("comment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_submits_accumulated_text_and_clears() {
        let mut entry = TextEntry::default();
        entry.activate("comment");
        entry.handle_key(key(KeyCode::Char('h')));
        entry.handle_key(key(KeyCode::Char('i')));

        match entry.handle_key(key(KeyCode::Enter)) {
            EntryAction::Submitted(text) => assert_eq!(text, "hi"),
            _ => panic!("expected a submit"),
        }
        assert!(!entry.active);
        assert_eq!(entry.input.value(), "");
    }

    #[test]
    fn test_escape_cancels_and_discards_text() {
        let mut entry = TextEntry::default();
        entry.activate("reply");
        entry.handle_key(key(KeyCode::Char('x')));

        assert!(matches!(
            entry.handle_key(key(KeyCode::Esc)),
            EntryAction::Cancelled
        ));
        assert!(!entry.active);
        assert_eq!(entry.input.value(), "");
    }
}
