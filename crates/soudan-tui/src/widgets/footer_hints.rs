//! Footer hint bar.
//!
//! Format: `Replying…                 [Enter] send │ [Esc] quit`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::controller::RequestPhase;
use crate::text::display_width;
use crate::theme::Theme;

/// A single keybinding hint.
#[derive(Debug, Clone)]
pub struct KeyHint {
    /// The key or key combination (e.g., "Enter", "Ctrl+J").
    pub key: String,
    /// The action description.
    pub action: String,
}

impl KeyHint {
    /// Create a new key hint.
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

/// Footer bar: request status on the left, key hints on the right.
pub struct FooterHints<'a> {
    hints: &'a [KeyHint],
    theme: &'a Theme,
    status: Option<&'a str>,
}

impl<'a> FooterHints<'a> {
    pub fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self {
            hints,
            theme,
            status: None,
        }
    }

    /// Status text shown on the left.
    #[must_use]
    pub fn status(mut self, status: Option<&'a str>) -> Self {
        self.status = status;
        self
    }
}

/// Status text for a request phase.
pub fn phase_status(phase: RequestPhase) -> Option<&'static str> {
    match phase {
        RequestPhase::Idle => None,
        RequestPhase::Sending => Some("送信中…"),
        RequestPhase::Streaming => Some("返信中…"),
    }
}

/// Hints for the current form state.
#[must_use]
pub fn hints_for_state(disabled: bool) -> Vec<KeyHint> {
    let mut hints = Vec::new();
    if !disabled {
        hints.push(KeyHint::new("Enter", "send"));
        hints.push(KeyHint::new("Ctrl+J", "newline"));
    }
    hints.push(KeyHint::new("PgUp/PgDn", "scroll"));
    hints.push(KeyHint::new("Esc", "quit"));
    hints
}

impl Widget for FooterHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut left_spans = Vec::new();
        let mut right_spans = Vec::new();

        if let Some(status) = self.status {
            left_spans.push(Span::styled(status, Style::default().fg(self.theme.info)));
        }

        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                right_spans.push(Span::styled(" │ ", Style::default().fg(self.theme.muted)));
            }
            right_spans.push(Span::styled("[", Style::default().fg(self.theme.muted)));
            right_spans.push(Span::styled(&hint.key, Style::default().fg(self.theme.primary)));
            right_spans.push(Span::styled("] ", Style::default().fg(self.theme.muted)));
            right_spans.push(Span::styled(&hint.action, Style::default().fg(self.theme.subtext)));
        }

        let left_width: usize = left_spans.iter().map(|s| display_width(&s.content)).sum();
        let right_width: usize = right_spans.iter().map(|s| display_width(&s.content)).sum();
        let padding = (area.width as usize).saturating_sub(left_width + right_width);
        if padding > 0 {
            left_spans.push(Span::raw(" ".repeat(padding)));
        }
        left_spans.extend(right_spans);

        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}
