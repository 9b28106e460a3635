//! Transcript widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::state::{MessageBlock, Role, TranscriptState};
use crate::text::wrap_lines;
use crate::theme::Theme;

/// Loading indicator frames, advanced once per tick.
const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Columns of indentation for block content.
const CONTENT_INDENT: usize = 2;

/// Scrollable list of message blocks, newest at the bottom.
pub struct TranscriptWidget<'a> {
    state: &'a TranscriptState,
    theme: &'a Theme,
    tick: u64,
}

impl<'a> TranscriptWidget<'a> {
    pub fn new(state: &'a TranscriptState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            tick: 0,
        }
    }

    /// Animation frame counter for loading indicators.
    #[must_use]
    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    fn role_color(&self, role: Role) -> ratatui::style::Color {
        match role {
            Role::User => self.theme.user,
            Role::Bot => self.theme.bot,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn frame_index(&self) -> usize {
        (self.tick % SPINNER.len() as u64) as usize
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.frame_index()]
    }

    fn block_rows(&self, block: &MessageBlock, width: usize) -> Vec<Line<'static>> {
        let mut rows = vec![Line::from(vec![
            Span::styled(
                block.role().label(),
                Style::default()
                    .fg(self.role_color(block.role()))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(block.time_str(), Style::default().fg(self.theme.muted)),
        ])];

        let indent = " ".repeat(CONTENT_INDENT);
        let body_width = width.saturating_sub(CONTENT_INDENT).max(1);

        if block.lines().is_empty() && block.is_loading() {
            let dots = ".".repeat(self.frame_index());
            rows.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(self.spinner(), Style::default().fg(self.theme.primary)),
                Span::styled(
                    format!(" 考えています{dots}"),
                    Style::default().fg(self.theme.muted),
                ),
            ]));
            return rows;
        }

        for line in wrap_lines(block.lines().to_vec(), body_width) {
            let mut spans = vec![Span::raw(indent.clone())];
            spans.extend(line.spans);
            rows.push(Line::from(spans));
        }

        if block.is_loading() {
            rows.push(Line::from(vec![
                Span::raw(indent),
                Span::styled(self.spinner(), Style::default().fg(self.theme.primary)),
            ]));
        }

        rows
    }

    fn frame(&self) -> Block<'static> {
        Block::default()
            .title(" 相談 ")
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.base))
    }

    /// Total rows and visible height when drawn into `area`.
    pub fn viewport(&self, area: Rect) -> (usize, usize) {
        let inner = self.frame().inner(area);
        if inner.width == 0 {
            return (0, inner.height as usize);
        }
        (self.rows(inner.width as usize).len(), inner.height as usize)
    }

    /// Every row of the transcript at `width`, oldest first.
    pub fn rows(&self, width: usize) -> Vec<Line<'static>> {
        let mut rows = Vec::new();
        for (i, block) in self.state.blocks().iter().enumerate() {
            if i > 0 {
                rows.push(Line::from(""));
            }
            rows.extend(self.block_rows(block, width));
        }
        rows
    }
}

impl Widget for TranscriptWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = self.frame();
        let inner = frame.inner(area);
        frame.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let rows = self.rows(inner.width as usize);
        let height = inner.height as usize;
        let max_scroll = rows.len().saturating_sub(height);
        let start = if self.state.is_following() {
            max_scroll
        } else {
            self.state.scroll_offset().min(max_scroll)
        };

        let visible: Vec<Line<'static>> = rows.into_iter().skip(start).take(height).collect();
        Paragraph::new(visible)
            .style(Style::default().fg(self.theme.text))
            .render(inner, buf);
    }
}
