//! Markdown styling.
//!
//! [`MarkdownStyles`] maps markdown elements to ratatui styles derived from
//! the active [`Theme`].

use ratatui::style::{Modifier, Style};

use crate::theme::Theme;

/// Styles for rendering markdown elements.
#[derive(Debug, Clone)]
pub struct MarkdownStyles {
    pub h1: Style,
    pub h2: Style,
    /// H3 and deeper.
    pub h3: Style,
    pub code: Style,
    pub code_block: Style,
    pub emphasis: Style,
    pub strong: Style,
    pub strikethrough: Style,
    /// Bullets, numbers and task checkboxes.
    pub list_marker: Style,
    pub link: Style,
    pub blockquote: Style,
    /// Horizontal rules.
    pub rule: Style,
    /// Base style for body text.
    pub text: Style,
}

impl MarkdownStyles {
    /// Derive styles from a theme.
    pub fn from_theme(theme: &Theme) -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let code = Style::default().fg(theme.secondary).bg(theme.surface);

        Self {
            h1: bold.fg(theme.primary),
            h2: bold.fg(theme.bot),
            h3: bold.fg(theme.subtext),
            code,
            code_block: code,
            emphasis: Style::default().add_modifier(Modifier::ITALIC),
            strong: bold,
            strikethrough: Style::default().add_modifier(Modifier::CROSSED_OUT),
            list_marker: Style::default().fg(theme.muted),
            link: Style::default()
                .fg(theme.info)
                .add_modifier(Modifier::UNDERLINED),
            blockquote: Style::default()
                .fg(theme.subtext)
                .add_modifier(Modifier::ITALIC),
            rule: Style::default().fg(theme.border),
            text: Style::default().fg(theme.text),
        }
    }
}

impl Default for MarkdownStyles {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}
