//! UI widgets for the chat view.
//!
//! - [`InputBar`] - Message input, replaced by a waiting indicator while disabled
//! - [`FooterHints`] - Request status and keybinding hints

mod footer_hints;
mod input_bar;

pub use footer_hints::{hints_for_state, phase_status, FooterHints, KeyHint};
pub use input_bar::InputBar;
