//! Chat controller: wires the form, the transcript, the conversation session
//! and the follow-up timer together.
//!
//! The controller is the only mutator of the transcript and the form. Reply
//! streams are consumed by a spawned forwarding task that posts
//! [`ControllerEvent`]s back through a channel, so every state change happens
//! on the UI loop in arrival order.
//!
//! A request moves through `Idle -> Sending -> Streaming -> Idle`. The form is
//! disabled for the whole cycle and re-enabled on both success and failure.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use soudan_engine::prompts::{
    CONFIG_ERROR_MESSAGE, FOLLOW_UP_PROMPT, INITIAL_GREETING, SYSTEM_INSTRUCTION,
    TRANSPORT_ERROR_MESSAGE,
};
use soudan_engine::{
    ChatService, Config, ConversationSession, DeltaStream, FollowUpScheduler, SessionConfig,
    TransportError, API_KEY_ENV,
};

use crate::form::FormState;
use crate::text::MarkdownStyles;
use crate::transcript::{BlockHandle, Role, TranscriptState};

/// Identifies one send/stream cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Events delivered to the UI loop.
#[derive(Debug)]
pub enum ControllerEvent {
    /// A reply fragment arrived.
    Delta { request: RequestId, text: String },
    /// The reply stream ended normally.
    Finished { request: RequestId },
    /// The reply stream failed.
    Failed {
        request: RequestId,
        error: TransportError,
    },
    /// The follow-up timer elapsed.
    FollowUpDue,
}

/// Where the current request is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    /// Waiting for the first fragment.
    Sending,
    /// At least one fragment has been shown.
    Streaming,
}

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// No usable credential was configured.
    #[error("{API_KEY_ENV} is not set")]
    MissingCredential,
}

#[derive(Debug)]
struct InFlight {
    id: RequestId,
    block: BlockHandle,
    /// Cumulative reply text received so far.
    reply: String,
    streaming: bool,
    task: JoinHandle<()>,
}

/// Owns the session, the follow-up timer and the widget state.
pub struct ChatController {
    transcript: TranscriptState,
    form: FormState,
    session: Option<Arc<dyn ConversationSession>>,
    scheduler: FollowUpScheduler,
    follow_up_delay: Duration,
    /// Set on the first user submission; guards the one-time follow-up.
    interacted: bool,
    /// Follow-up fired while a request was outstanding.
    follow_up_pending: bool,
    inflight: Option<InFlight>,
    next_request: u64,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl ChatController {
    /// Create an uninitialized controller.
    pub fn new(styles: MarkdownStyles) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transcript: TranscriptState::new(styles),
            form: FormState::new(),
            session: None,
            scheduler: FollowUpScheduler::new(),
            follow_up_delay: Config::default().follow_up_delay(),
            interacted: false,
            follow_up_pending: false,
            inflight: None,
            next_request: 0,
            events_tx,
            events_rx,
        }
    }

    /// Create the session and send the greeting.
    ///
    /// Without a credential the transcript shows the configuration error, the
    /// form stays disabled for good, and no session is created.
    pub fn initialize(
        &mut self,
        config: &Config,
        service: &dyn ChatService,
    ) -> Result<(), InitError> {
        let Some(api_key) = config.api_key() else {
            tracing::warn!(env = API_KEY_ENV, "credential missing, chat disabled");
            self.transcript
                .display_message(Role::Bot, CONFIG_ERROR_MESSAGE, false);
            self.form.set_disabled(true);
            return Err(InitError::MissingCredential);
        };

        self.follow_up_delay = config.follow_up_delay();
        let session = service.start_session(SessionConfig {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
        });
        self.session = Some(session);
        self.send(INITIAL_GREETING);
        Ok(())
    }

    /// Submit the form. Returns whether a message was sent.
    ///
    /// Blank input and submissions while a request is outstanding are no-ops.
    pub fn submit(&mut self) -> bool {
        if self.session.is_none() || self.inflight.is_some() {
            return false;
        }
        let Some(text) = self.form.take_submission() else {
            return false;
        };

        self.transcript.display_message(Role::User, &text, false);

        if !self.interacted {
            self.interacted = true;
            self.arm_follow_up();
        }

        self.send(&text);
        true
    }

    fn arm_follow_up(&mut self) {
        let tx = self.events_tx.clone();
        self.scheduler.arm(self.follow_up_delay, move || {
            // The receiver only closes when the controller is gone.
            let _ = tx.send(ControllerEvent::FollowUpDue);
        });
    }

    /// Start a request: disable the form, show a loading block, and spawn the
    /// forwarding task.
    fn send(&mut self, text: &str) {
        let Some(session) = self.session.clone() else {
            return;
        };

        self.next_request += 1;
        let id = RequestId(self.next_request);

        self.form.set_disabled(true);
        let block = self.transcript.display_message(Role::Bot, "", true);

        tracing::debug!(request = id.0, chars = text.chars().count(), "sending message");
        let stream = session.send_stream(text);
        let task = tokio::spawn(forward(id, stream, self.events_tx.clone()));

        self.inflight = Some(InFlight {
            id,
            block,
            reply: String::new(),
            streaming: false,
            task,
        });
    }

    /// Apply one event. Events for a request that is no longer current are
    /// ignored.
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Delta { request, text } => {
                let Some(inflight) = self.inflight.as_mut().filter(|f| f.id == request) else {
                    return;
                };
                inflight.reply.push_str(&text);
                inflight.streaming = true;
                self.transcript.set_markdown(inflight.block, &inflight.reply);
            }
            ControllerEvent::Finished { request } => {
                let Some(inflight) = self.inflight.as_ref().filter(|f| f.id == request) else {
                    return;
                };
                tracing::debug!(
                    request = request.0,
                    chars = inflight.reply.chars().count(),
                    "reply finished"
                );
                self.transcript.set_loading(inflight.block, false);
                self.complete();
            }
            ControllerEvent::Failed { request, error } => {
                let Some(inflight) = self.inflight.as_ref().filter(|f| f.id == request) else {
                    return;
                };
                tracing::error!(request = request.0, error = %error, "reply stream failed");
                self.transcript
                    .set_markdown(inflight.block, TRANSPORT_ERROR_MESSAGE);
                self.transcript.set_loading(inflight.block, false);
                self.complete();
            }
            ControllerEvent::FollowUpDue => {
                if self.session.is_none() {
                    return;
                }
                if self.inflight.is_some() {
                    tracing::debug!("follow-up due while busy, deferring");
                    self.follow_up_pending = true;
                } else {
                    tracing::info!("sending follow-up");
                    self.send(FOLLOW_UP_PROMPT);
                }
            }
        }
    }

    /// Return to idle after success or failure.
    fn complete(&mut self) {
        self.inflight = None;
        self.form.set_disabled(false);
        self.form.focus_input();

        if self.follow_up_pending {
            self.follow_up_pending = false;
            tracing::info!("sending deferred follow-up");
            self.send(FOLLOW_UP_PROMPT);
        }
    }

    /// Wait for the next event.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events_rx.recv().await
    }

    /// Process events until no request is outstanding.
    pub async fn run_until_idle(&mut self) {
        while self.inflight.is_some() {
            match self.events_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }

    /// Cancel the timer, abort any running stream and drop the session.
    pub fn dispose(&mut self) {
        self.scheduler.cancel();
        if let Some(inflight) = self.inflight.take() {
            inflight.task.abort();
        }
        if self.session.take().is_some() {
            tracing::debug!("chat session disposed");
        }
    }

    pub fn phase(&self) -> RequestPhase {
        match &self.inflight {
            None => RequestPhase::Idle,
            Some(inflight) if inflight.streaming => RequestPhase::Streaming,
            Some(_) => RequestPhase::Sending,
        }
    }

    pub fn transcript(&self) -> &TranscriptState {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut TranscriptState {
        &mut self.transcript
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the follow-up timer is armed and has not fired.
    pub fn follow_up_armed(&self) -> bool {
        self.scheduler.is_armed()
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Forward a reply stream to the controller channel, then report how it ended.
async fn forward(
    request: RequestId,
    mut stream: DeltaStream,
    tx: mpsc::UnboundedSender<ControllerEvent>,
) {
    while let Some(item) = stream.next().await {
        let event = match item {
            Ok(text) => ControllerEvent::Delta { request, text },
            Err(error) => {
                let _ = tx.send(ControllerEvent::Failed { request, error });
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
    let _ = tx.send(ControllerEvent::Finished { request });
}
