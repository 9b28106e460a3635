//! Color palettes for the chat widget.
//!
//! [`Theme::resolve`] picks a palette by name (`mocha`, `latte`,
//! `high-contrast`) and honors `NO_COLOR`.

mod colors;

pub use colors::Theme;
