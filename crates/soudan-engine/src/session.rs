//! Conversation session abstraction.
//!
//! A [`ChatService`] creates one [`ConversationSession`] per run. The session
//! keeps the conversation history and streams each reply as ordered text
//! deltas that the caller concatenates.

use futures::stream::BoxStream;
use std::sync::Arc;

/// Lazy, finite stream of reply deltas. Not restartable.
pub type DeltaStream = BoxStream<'static, Result<String, TransportError>>;

/// Immutable settings fixed when a session is created.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service credential.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// System instruction supplied once for the whole session.
    pub system_instruction: String,
}

/// Factory for conversation sessions.
pub trait ChatService: Send + Sync {
    /// Create a session with a fixed system instruction and model.
    fn start_session(&self, config: SessionConfig) -> Arc<dyn ConversationSession>;
}

/// Handle to one conversational context.
pub trait ConversationSession: Send + Sync {
    /// Send a message and stream the reply.
    ///
    /// Nothing is sent until the stream is first polled. The message and the
    /// full reply join the history only once the stream ends successfully.
    fn send_stream(&self, text: &str) -> DeltaStream;
}

/// Errors produced while sending a message or reading its reply.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or HTTP client failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// A stream event could not be decoded.
    #[error("could not decode stream event: {0}")]
    Decode(#[source] serde_json::Error),

    /// Service reported an error inside the stream.
    #[error("service error: {0}")]
    Service(String),

    /// Prompt was rejected by the service's safety filters.
    #[error("prompt blocked: {0}")]
    Blocked(String),
}
