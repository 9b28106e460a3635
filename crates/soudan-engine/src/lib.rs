//! soudan-engine: Headless engine for the soudan chat widget
//!
//! This crate provides everything that does not touch the terminal:
//! - Configuration loading
//! - The conversation session abstraction and its Gemini implementation
//! - The one-shot follow-up scheduler
//! - Fixed prompts and user-facing messages

pub mod config;
pub mod gemini;
pub mod prompts;
pub mod scheduler;
pub mod session;

// Re-export commonly used types
pub use config::{Config, ConfigError, API_KEY_ENV};
pub use gemini::{parse_event, Content, GeminiService, GeminiSession, SseDecoder};
pub use scheduler::{FollowUpScheduler, TimerId};
pub use session::{ChatService, ConversationSession, DeltaStream, SessionConfig, TransportError};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
