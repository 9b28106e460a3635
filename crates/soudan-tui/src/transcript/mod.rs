//! Transcript of the conversation.
//!
//! Holds the rendered message blocks and the scroll position, and draws them.

mod state;
mod widget;

pub use state::{BlockHandle, MessageBlock, Role, TranscriptState, SCROLL_SPEED};
pub use widget::TranscriptWidget;
