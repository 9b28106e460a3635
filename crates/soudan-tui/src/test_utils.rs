//! Test utilities: terminal helpers and a scripted conversation service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use soudan_engine::{ChatService, ConversationSession, DeltaStream, SessionConfig, TransportError};

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Create a test terminal with the default dimensions (80x24).
pub fn create_test_terminal() -> Terminal<TestBackend> {
    create_test_terminal_sized(TEST_WIDTH, TEST_HEIGHT)
}

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Convert a buffer to a string, one row per line, trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            let cell = buffer.cell((x, y)).unwrap();
            result.push_str(cell.symbol());
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// One scripted reply: the deltas and errors its stream yields, in order.
pub type Script = Vec<Result<String, TransportError>>;

/// Session that replays scripted replies and records every prompt.
#[derive(Default)]
pub struct ScriptedSession {
    replies: Mutex<VecDeque<Script>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedSession {
    /// Replies are used one per `send_stream` call; once exhausted, replies
    /// are empty.
    pub fn new(replies: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Every prompt sent so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ConversationSession for ScriptedSession {
    fn send_stream(&self, text: &str) -> DeltaStream {
        self.prompts.lock().unwrap().push(text.to_string());
        let script = self.replies.lock().unwrap().pop_front().unwrap_or_default();
        stream::iter(script).boxed()
    }
}

/// Service handing out a shared [`ScriptedSession`].
pub struct ScriptedService {
    session: Arc<ScriptedSession>,
    starts: AtomicUsize,
    last_config: Mutex<Option<SessionConfig>>,
}

impl ScriptedService {
    pub fn new(session: Arc<ScriptedSession>) -> Self {
        Self {
            session,
            starts: AtomicUsize::new(0),
            last_config: Mutex::new(None),
        }
    }

    /// Number of sessions started.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Settings of the most recently started session.
    pub fn last_config(&self) -> Option<SessionConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

impl ChatService for ScriptedService {
    fn start_session(&self, config: SessionConfig) -> Arc<dyn ConversationSession> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap() = Some(config);
        Arc::clone(&self.session) as Arc<dyn ConversationSession>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_terminal() {
        let terminal = create_test_terminal();
        let size = terminal.size().unwrap();
        assert_eq!(size.width, TEST_WIDTH);
        assert_eq!(size.height, TEST_HEIGHT);
    }

    #[test]
    fn test_buffer_to_string() {
        let mut terminal = create_test_terminal_sized(10, 2);
        terminal
            .draw(|frame| {
                frame.render_widget(ratatui::widgets::Paragraph::new("hi"), frame.area());
            })
            .unwrap();
        assert_eq!(buffer_to_string(terminal.backend().buffer()), "hi\n");
    }

    #[tokio::test]
    async fn test_scripted_session_replays_in_order() {
        let session = ScriptedSession::new(vec![vec![Ok("a".into()), Ok("b".into())]]);

        let first: Vec<_> = session.send_stream("one").collect().await;
        let second: Vec<_> = session.send_stream("two").collect().await;

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(session.prompts(), vec!["one", "two"]);
    }
}
