//! Gemini conversation service over `streamGenerateContent` (SSE).
//!
//! The REST API is stateless, so [`GeminiSession`] keeps the conversation
//! history and resends it with every turn.

use crate::session::{ChatService, ConversationSession, DeltaStream, SessionConfig, TransportError};
use bytes::Bytes;
use futures::future::TryFutureExt;
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One conversation turn (or the system instruction, which has no role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text parts, concatenated in order.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Some("user"), text)
    }

    /// A model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role(Some("model"), text)
    }

    /// Content without a role (system instruction).
    pub fn instruction(text: impl Into<String>) -> Self {
        Self::with_role(None, text)
    }

    fn with_role(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(String::from),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts.iter().map(|part| part.text.as_str()).collect()
    }
}

/// A text part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Part text (empty for non-text parts).
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: String,
}

/// Extract the reply text carried by one SSE `data:` payload.
///
/// Returns `Ok(None)` for payloads without text (metadata-only chunks).
pub fn parse_event(data: &str) -> Result<Option<String>, TransportError> {
    let response: GenerateContentResponse =
        serde_json::from_str(data).map_err(TransportError::Decode)?;

    if let Some(error) = response.error {
        return Err(TransportError::Service(error.message));
    }

    if response.candidates.is_empty() {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(TransportError::Blocked(reason));
        }
    }

    let text = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(Content::text)
        .unwrap_or_default();

    Ok((!text.is_empty()).then_some(text))
}

/// Incremental server-sent events decoder.
///
/// Buffers raw bytes so that events (and multi-byte characters) split across
/// network chunks are only decoded once complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the `data:` payloads of every completed event.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((end, separator_len)) = find_event_boundary(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + separator_len).collect();
            if let Some(data) = event_data(&block[..end]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let block = std::mem::take(&mut self.buffer);
        event_data(&block)
    }
}

/// Position and length of the first blank-line separator.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Join the `data:` lines of one event block. Comments and other fields are ignored.
fn event_data(block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(block);
    let data_lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();

    let data = data_lines.join("\n");
    (!data.trim().is_empty()).then_some(data)
}

fn lock(history: &Mutex<Vec<Content>>) -> MutexGuard<'_, Vec<Content>> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A user message waiting for its reply before joining the history.
struct PendingTurn {
    history: Arc<Mutex<Vec<Content>>>,
    user: Content,
}

impl PendingTurn {
    fn commit(self, reply: String) {
        let mut history = lock(&self.history);
        history.push(self.user);
        history.push(Content::model(reply));
        tracing::debug!(turns = history.len(), "reply recorded");
    }
}

struct ReplyState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<String>,
    reply: String,
    turn: Option<PendingTurn>,
    /// Failure reported after the deltas queued ahead of it.
    pending_error: Option<TransportError>,
    exhausted: bool,
}

impl<S> ReplyState<S> {
    fn enqueue(&mut self, data: &str) {
        if self.pending_error.is_some() {
            return;
        }
        match parse_event(data) {
            Ok(Some(delta)) => self.ready.push_back(delta),
            Ok(None) => {}
            Err(error) => self.pending_error = Some(error),
        }
    }
}

async fn next_delta<S>(
    mut state: ReplyState<S>,
) -> Result<Option<(String, ReplyState<S>)>, TransportError>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    loop {
        if let Some(delta) = state.ready.pop_front() {
            state.reply.push_str(&delta);
            return Ok(Some((delta, state)));
        }

        // Dropping the state here discards the turn unrecorded.
        if let Some(error) = state.pending_error.take() {
            return Err(error);
        }

        if state.exhausted {
            if let Some(turn) = state.turn.take() {
                turn.commit(std::mem::take(&mut state.reply));
            }
            return Ok(None);
        }

        match state.bytes.next().await {
            Some(Ok(chunk)) => {
                for data in state.decoder.push(&chunk) {
                    state.enqueue(&data);
                }
            }
            Some(Err(error)) => state.pending_error = Some(error.into()),
            None => {
                if let Some(data) = state.decoder.finish() {
                    state.enqueue(&data);
                }
                state.exhausted = true;
            }
        }
    }
}

/// Turn a response body into reply deltas, recording the turn when it ends cleanly.
fn reply_deltas<S>(
    bytes: S,
    turn: PendingTurn,
) -> impl Stream<Item = Result<String, TransportError>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let state = ReplyState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        reply: String::new(),
        turn: Some(turn),
        pending_error: None,
        exhausted: false,
    };
    stream::try_unfold(state, next_delta)
}

async fn open_reply(
    request: RequestBuilder,
    turn: PendingTurn,
) -> Result<impl Stream<Item = Result<String, TransportError>> + Send + 'static, TransportError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(reply_deltas(response.bytes_stream(), turn))
}

/// [`ChatService`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiService {
    client: Client,
    base_url: String,
}

impl GeminiService {
    /// Create a service talking to `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for GeminiService {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GeminiService {
    /// Create a session with concrete type (see [`ChatService::start_session`]).
    pub fn session(&self, config: SessionConfig) -> GeminiSession {
        GeminiSession {
            client: self.client.clone(),
            endpoint: format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key,
            system_instruction: Content::instruction(config.system_instruction),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ChatService for GeminiService {
    fn start_session(&self, config: SessionConfig) -> Arc<dyn ConversationSession> {
        tracing::info!(model = %config.model, "starting conversation session");
        Arc::new(self.session(config))
    }
}

/// A Gemini conversation with its history.
pub struct GeminiSession {
    client: Client,
    endpoint: String,
    api_key: String,
    system_instruction: Content,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiSession {
    /// Snapshot of the recorded turns.
    pub fn history(&self) -> Vec<Content> {
        lock(&self.history).clone()
    }

    /// Streaming endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ConversationSession for GeminiSession {
    fn send_stream(&self, text: &str) -> DeltaStream {
        let user = Content::user(text);
        let mut contents = self.history();
        contents.push(user.clone());

        let body = GenerateContentRequest {
            system_instruction: self.system_instruction.clone(),
            contents,
        };
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let turn = PendingTurn {
            history: Arc::clone(&self.history),
            user,
        };

        open_reply(request, turn).try_flatten_stream().boxed()
    }
}
