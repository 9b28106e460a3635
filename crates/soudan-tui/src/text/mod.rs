//! Text rendering utilities.
//!
//! - [`render_markdown`] - Render markdown to styled ratatui Lines
//! - [`MarkdownStyles`] - Style configuration for markdown elements
//! - [`wrap_lines`] - Cell-width aware wrapping of styled Lines

mod markdown;
mod styles;
mod wrap;

pub use markdown::{plain_text, render_markdown};
pub use styles::MarkdownStyles;
pub use wrap::{display_width, wrap_lines};
