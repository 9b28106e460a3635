//! Transcript state: message blocks and scrolling.

use chrono::{DateTime, Local};
use ratatui::text::Line;

use crate::text::{plain_text, render_markdown, MarkdownStyles};

/// Rows scrolled per mouse wheel tick.
pub const SCROLL_SPEED: usize = 3;

/// Who a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Label shown above the block.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "あなた",
            Role::Bot => "カウンセラー",
        }
    }
}

/// Handle to a block, used to replace its content while a reply streams in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(usize);

/// One rendered message.
#[derive(Debug, Clone)]
pub struct MessageBlock {
    role: Role,
    /// Markdown source of the current content.
    source: String,
    /// Converted content.
    lines: Vec<Line<'static>>,
    loading: bool,
    created_at: DateTime<Local>,
}

impl MessageBlock {
    fn new(role: Role, text: &str, loading: bool, styles: &MarkdownStyles) -> Self {
        let mut block = Self {
            role,
            source: String::new(),
            lines: Vec::new(),
            loading,
            created_at: Local::now(),
        };
        block.set_content(text, styles);
        block
    }

    /// Replace the content, converting `text` from markdown.
    pub fn set_content(&mut self, text: &str, styles: &MarkdownStyles) {
        self.source = text.to_string();
        self.lines = render_markdown(text, styles);
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Markdown source of the current content.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// Content as plain text, markup removed.
    pub fn plain(&self) -> String {
        plain_text(&self.lines)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Local creation time as `HH:MM`.
    pub fn time_str(&self) -> String {
        self.created_at.format("%H:%M").to_string()
    }
}

/// All blocks in display order plus the scroll position.
#[derive(Debug)]
pub struct TranscriptState {
    blocks: Vec<MessageBlock>,
    styles: MarkdownStyles,
    /// First visible row while not following.
    scroll_offset: usize,
    /// Largest valid `scroll_offset` at the last render.
    max_offset: usize,
    /// Whether the view sticks to the newest entry.
    follow: bool,
}

impl Default for TranscriptState {
    fn default() -> Self {
        Self::new(MarkdownStyles::default())
    }
}

impl TranscriptState {
    pub fn new(styles: MarkdownStyles) -> Self {
        Self {
            blocks: Vec::new(),
            styles,
            scroll_offset: 0,
            max_offset: 0,
            follow: true,
        }
    }

    /// Append a block and scroll to it.
    pub fn display_message(&mut self, role: Role, text: &str, loading: bool) -> BlockHandle {
        self.blocks
            .push(MessageBlock::new(role, text, loading, &self.styles));
        self.jump_to_end();
        BlockHandle(self.blocks.len() - 1)
    }

    /// Replace a block's content with `text` converted from markdown.
    pub fn set_markdown(&mut self, handle: BlockHandle, text: &str) {
        if let Some(block) = self.blocks.get_mut(handle.0) {
            block.set_content(text, &self.styles);
        }
    }

    pub fn set_loading(&mut self, handle: BlockHandle, loading: bool) {
        if let Some(block) = self.blocks.get_mut(handle.0) {
            block.loading = loading;
        }
    }

    pub fn block(&self, handle: BlockHandle) -> Option<&MessageBlock> {
        self.blocks.get(handle.0)
    }

    pub fn blocks(&self) -> &[MessageBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First visible row.
    pub fn scroll_offset(&self) -> usize {
        if self.follow {
            self.max_offset
        } else {
            self.scroll_offset
        }
    }

    /// Rows between the view and the bottom.
    pub fn scroll_from_bottom(&self) -> usize {
        self.max_offset.saturating_sub(self.scroll_offset())
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Record the rendered geometry: `total_rows` rows in a view `height` rows tall.
    ///
    /// A view that is not following keeps its first row, so content growing
    /// below it does not move it.
    pub fn set_viewport(&mut self, total_rows: usize, height: usize) {
        self.max_offset = total_rows.saturating_sub(height);
        if self.follow {
            self.scroll_offset = self.max_offset;
        } else {
            self.scroll_offset = self.scroll_offset.min(self.max_offset);
        }
    }

    /// Scroll toward older blocks. Disables follow mode.
    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset().saturating_sub(rows);
        self.follow = false;
    }

    /// Scroll toward newer blocks. Reaching the bottom re-enables follow mode.
    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_offset = self
            .scroll_offset()
            .saturating_add(rows)
            .min(self.max_offset);
        if self.scroll_offset == self.max_offset {
            self.follow = true;
        }
    }

    /// Jump to the newest block and follow it.
    pub fn jump_to_end(&mut self) {
        self.follow = true;
        self.scroll_offset = self.max_offset;
    }
}
