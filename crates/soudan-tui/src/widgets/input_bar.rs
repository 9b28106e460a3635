//! Full-width input bar widget.
//!
//! Always visible at the bottom of the screen. Supports multi-line input
//! with Ctrl+J for newlines. While the form is disabled it shows a waiting
//! indicator instead of the input.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::form::FormState;
use crate::theme::Theme;

/// Placeholder shown in an empty, enabled input.
const PLACEHOLDER: &str = "メッセージを入力…";

/// Full-width input bar for text entry.
pub struct InputBar<'a> {
    form: &'a FormState,
    theme: &'a Theme,
    /// Text shown while disabled.
    waiting: Option<&'a str>,
}

impl<'a> InputBar<'a> {
    /// Create a new input bar widget.
    pub fn new(form: &'a FormState, theme: &'a Theme) -> Self {
        Self {
            form,
            theme,
            waiting: None,
        }
    }

    /// Text shown in place of the input while the form is disabled.
    #[must_use]
    pub fn waiting(mut self, text: &'a str) -> Self {
        self.waiting = Some(text);
        self
    }

    /// Build Lines for multi-line input display.
    /// Returns the lines to display and which line index contains the cursor.
    fn build_input_lines(&self) -> (Vec<Line<'static>>, usize) {
        let input = self.form.input();
        let content = input.content();
        let cursor_pos = input.cursor();
        let focused = self.form.is_focused();

        if content.is_empty() {
            let mut spans = vec![Span::styled("> ", Style::default().fg(self.theme.primary))];
            if focused {
                spans.push(Span::raw("█"));
            }
            spans.push(Span::styled(
                PLACEHOLDER,
                Style::default().fg(self.theme.muted),
            ));
            return (vec![Line::from(spans)], 0);
        }

        let text_lines: Vec<&str> = content.split('\n').collect();

        // Find which line the cursor is on
        let mut char_count = 0;
        let mut cursor_line = 0;
        let mut cursor_col = 0;
        for (line_idx, line) in text_lines.iter().enumerate() {
            let line_len = line.chars().count();
            if cursor_pos <= char_count + line_len {
                cursor_line = line_idx;
                cursor_col = cursor_pos - char_count;
                break;
            }
            // +1 for the newline character
            char_count += line_len + 1;
        }

        let mut lines = Vec::with_capacity(text_lines.len());
        for (line_idx, line_text) in text_lines.iter().enumerate() {
            let prefix = if line_idx == 0 { "> " } else { "  " };
            let mut spans = vec![Span::styled(
                prefix,
                Style::default().fg(self.theme.primary),
            )];

            if focused && line_idx == cursor_line {
                let chars: Vec<char> = line_text.chars().collect();
                let split = cursor_col.min(chars.len());
                spans.push(Span::raw(chars[..split].iter().collect::<String>()));
                spans.push(Span::raw("█"));
                spans.push(Span::raw(chars[split..].iter().collect::<String>()));
            } else {
                spans.push(Span::raw((*line_text).to_string()));
            }
            lines.push(Line::from(spans));
        }

        (lines, cursor_line)
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.form.is_focused() {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner_height = area.height.saturating_sub(2) as usize;

        let paragraph = if self.form.is_disabled() {
            let display = format!("● {}", self.waiting.unwrap_or("お待ちください"));
            Paragraph::new(display)
                .block(block)
                .style(Style::default().fg(self.theme.muted))
        } else {
            let (lines, cursor_line) = self.build_input_lines();

            // Keep the cursor line visible
            let scroll_offset = if lines.len() <= inner_height {
                0
            } else {
                cursor_line.saturating_sub(inner_height.saturating_sub(1))
            };

            Paragraph::new(lines)
                .block(block)
                .style(Style::default().fg(self.theme.text))
                .scroll((scroll_offset as u16, 0))
        };

        paragraph.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{buffer_to_string, create_test_terminal_sized};

    fn draw(form: &FormState, waiting: &str) -> String {
        let theme = Theme::default();
        let mut terminal = create_test_terminal_sized(40, 5);
        terminal
            .draw(|frame| {
                let bar = InputBar::new(form, &theme).waiting(waiting);
                frame.render_widget(bar, frame.area());
            })
            .unwrap();
        buffer_to_string(terminal.backend().buffer())
    }

    #[test]
    fn test_renders_input_with_cursor() {
        let mut form = FormState::new();
        let input = form.input_mut().unwrap();
        input.insert_str("hello");
        input.move_left();

        let content = draw(&form, "wait");
        assert!(content.contains("> hell█o"));
    }

    #[test]
    fn test_multiline_continuation_indent() {
        let mut form = FormState::new();
        form.input_mut().unwrap().insert_str("one\ntwo");

        let content = draw(&form, "wait");
        assert!(content.contains("> one"));
        assert!(content.contains("  two█"));
    }

    #[test]
    fn test_disabled_shows_waiting_text() {
        let mut form = FormState::new();
        form.input_mut().unwrap().insert_str("draft");
        form.set_disabled(true);

        let content = draw(&form, "replying");
        assert!(content.contains("● replying"));
        assert!(!content.contains("draft"));
    }
}
