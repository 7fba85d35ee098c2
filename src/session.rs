//! The session state machine governing one feedback request.
//!
//! A session owns its request from presentation to resolution. Two event
//! sources race to resolve it, the human's submit action (via the surface)
//! and the auto-continue countdown, and both feed the same reducer through
//! one channel. The state tag leaves `AwaitingInput` exactly once: whichever
//! event the reducer consumes first wins, and later events are ignored.

use crate::config::{project_key, ConfigStore, ProjectConfig};
use crate::envelope::{validate_images, FeedbackRequest, FeedbackResponse, RawImage};
use crate::schedule::TimeoutScheduler;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// States and events
// ---------------------------------------------------------------------------

/// Lifecycle tag for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, surface not yet live.
    Created,
    /// Surface presented, countdown armed, reducer consuming events.
    AwaitingInput,
    /// Resolved by an explicit human submit.
    UserResolved,
    /// Resolved by the countdown firing first.
    TimedOut,
    /// Resolved by an explicit plan approval (confirm workflow engaged).
    Confirmed,
    /// Resolved by an explicit plan rejection (confirm workflow engaged).
    Rejected,
    /// Terminal; the response has been handed off.
    Closed,
}

impl SessionState {
    /// True for states that end the wait for input.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::UserResolved | Self::TimedOut | Self::Confirmed | Self::Rejected
        )
    }
}

/// What the human handed over on submit.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Free-form feedback text; may be empty.
    pub text: String,
    /// Image payloads as pasted/dropped into the surface.
    pub images: Vec<RawImage>,
    /// Plan verdict. Only meaningful while the confirm workflow is engaged;
    /// `None` on a proposal round, `Some` on a confirmation round.
    pub confirmed: Option<bool>,
}

/// Events accepted by the session reducer.
#[derive(Debug)]
pub enum SessionEvent {
    /// Explicit human submit; resolves the session.
    Submitted(Submission),
    /// The countdown ran out; resolves the session with the sentinel.
    TimerFired,
    /// Fresh console output from the project command.
    CommandOutput(String),
    /// The human edited project settings without submitting.
    ConfigEdited(ProjectConfig),
    /// The human toggled the command section; persisted immediately.
    SectionToggled(bool),
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable sender half given to the surface and the scheduler.
///
/// Sends after resolution land on a closed channel and are dropped; late
/// events lose silently.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Deliver the human's submission.
    pub fn submit(&self, submission: Submission) {
        let _ = self.tx.send(SessionEvent::Submitted(submission));
    }

    /// Deliver the countdown's fire event.
    pub fn timer_fired(&self) {
        let _ = self.tx.send(SessionEvent::TimerFired);
    }

    /// Append captured command output to the session log.
    pub fn append_log(&self, chunk: impl Into<String>) {
        let _ = self.tx.send(SessionEvent::CommandOutput(chunk.into()));
    }

    /// Stage a settings edit to be persisted when the session closes.
    pub fn edit_config(&self, config: ProjectConfig) {
        let _ = self.tx.send(SessionEvent::ConfigEdited(config));
    }

    /// Toggle command-section visibility; written through immediately.
    pub fn toggle_section(&self, visible: bool) {
        let _ = self.tx.send(SessionEvent::SectionToggled(visible));
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// What a finished session hands back to the entry point.
#[derive(Debug)]
pub struct SessionOutcome {
    /// The one response produced for this call.
    pub response: FeedbackResponse,
    /// Which resolution won the race.
    pub resolution: SessionState,
    /// Settings edit staged by the human, if any.
    pub config_edit: Option<ProjectConfig>,
}

/// In-memory state machine for one feedback request.
pub struct Session {
    request: FeedbackRequest,
    config: ProjectConfig,
    state: SessionState,
    scheduler: TimeoutScheduler,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    logs: String,
    pending_config: Option<ProjectConfig>,
    response: Option<FeedbackResponse>,
}

impl Session {
    /// Build a session and the handle its event producers will use.
    ///
    /// The scheduler's fire callback feeds the same channel as the surface,
    /// so resolution order is decided by a single consumer.
    pub fn new(request: FeedbackRequest, config: ProjectConfig) -> (Self, SessionHandle) {
        let (tx, events) = mpsc::unbounded_channel();
        let handle = SessionHandle { tx };
        let timer_handle = handle.clone();
        let scheduler = TimeoutScheduler::new(move || timer_handle.timer_fired());
        (
            Self {
                request,
                config,
                state: SessionState::Created,
                scheduler,
                events,
                logs: String::new(),
                pending_config: None,
                response: None,
            },
            handle,
        )
    }

    /// The request this session owns.
    pub fn request(&self) -> &FeedbackRequest {
        &self.request
    }

    /// Current lifecycle tag.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Arm the countdown and consume events until resolution.
    ///
    /// Returns exactly one outcome. The store is only touched for immediate
    /// section-visibility writes; staged edits are returned to the caller.
    pub async fn run(mut self, store: &ConfigStore) -> SessionOutcome {
        let timeout = self.request.timeout;
        let project = project_key(&self.request.project_directory);
        self.scheduler.arm(timeout);
        self.state = SessionState::AwaitingInput;

        while !self.state.is_resolution() {
            // The scheduler holds a handle clone, so the channel cannot close
            // while the session is awaiting input; the fallback below is for
            // completeness, not an expected path.
            let Some(event) = self.events.recv().await else {
                self.resolve_timeout();
                break;
            };
            match event {
                SessionEvent::Submitted(submission) => self.resolve_submission(submission),
                SessionEvent::TimerFired => self.resolve_timeout(),
                SessionEvent::CommandOutput(chunk) => {
                    self.logs.push_str(&chunk);
                    self.scheduler.reset(timeout);
                }
                SessionEvent::ConfigEdited(config) => {
                    self.pending_config = Some(config);
                    self.scheduler.reset(timeout);
                }
                SessionEvent::SectionToggled(visible) => {
                    let mut config = self
                        .pending_config
                        .take()
                        .unwrap_or_else(|| self.config.clone());
                    config.command_section_visible = visible;
                    if let Err(e) = store.save(&project, &config) {
                        tracing::warn!("failed to persist section visibility for {project}: {e}");
                    }
                    self.pending_config = Some(config);
                    self.scheduler.reset(timeout);
                }
            }
        }

        self.scheduler.disarm();
        let resolution = self.state;
        self.state = SessionState::Closed;
        let response = self
            .response
            .take()
            .unwrap_or_else(|| FeedbackResponse::auto_continue(std::mem::take(&mut self.logs)));
        SessionOutcome {
            response,
            resolution,
            config_edit: self.pending_config.take(),
        }
    }

    /// Reducer arm for an explicit submit.
    fn resolve_submission(&mut self, submission: Submission) {
        // Single-assignment guard: only the first resolution is applied.
        if self.state != SessionState::AwaitingInput {
            return;
        }
        let images = validate_images(submission.images);
        // A verdict only counts while the confirm workflow is engaged for
        // this project; otherwise `confirmed` stays null for the caller.
        let (state, confirmed) = if self.config.confirm_before_execute {
            match submission.confirmed {
                Some(true) => (SessionState::Confirmed, Some(true)),
                Some(false) => (SessionState::Rejected, Some(false)),
                None => (SessionState::UserResolved, None),
            }
        } else {
            (SessionState::UserResolved, None)
        };
        self.state = state;
        self.response = Some(FeedbackResponse {
            interactive_feedback: submission.text,
            images,
            logs: std::mem::take(&mut self.logs),
            confirmed,
        });
    }

    /// Reducer arm for the countdown firing.
    fn resolve_timeout(&mut self) {
        if self.state != SessionState::AwaitingInput {
            return;
        }
        self.state = SessionState::TimedOut;
        self.response = Some(FeedbackResponse::auto_continue(std::mem::take(
            &mut self.logs,
        )));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("task_id", &self.request.task_id)
            .field("state", &self.state)
            .finish()
    }
}
