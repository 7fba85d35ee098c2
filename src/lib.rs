//! Holdup — a human-in-the-loop feedback bridge for AI coding agents.
//!
//! This crate exposes one callable tool, `interactive_feedback`, that pauses
//! an agent's workflow, presents a request to the human operator, and
//! returns their decision (text, image attachments, workflow flags). The
//! interesting part is the session lifecycle: a countdown keeps the call
//! alive across IDE idle timeouts by synthesizing an auto-continue response,
//! an opt-in propose-then-confirm workflow spans two independent calls, and
//! per-project settings persist across invocations that share no process
//! memory.
//!
//! # Quick start
//!
//! ```no_run
//! use holdup::bridge::run_feedback_session;
//! use holdup::config::ConfigStore;
//! use holdup::envelope::FeedbackRequest;
//! use holdup::surface::TerminalSurface;
//!
//! # async fn example() {
//! let store = ConfigStore::open_default().unwrap();
//! let request = FeedbackRequest::new("/path/to/project", "Parser refactor done; next?", "task-42");
//! let surface = TerminalSurface::new();
//! let response = run_feedback_session(request, &store, &surface, None).await.unwrap();
//! println!("{}", response.interactive_feedback);
//! # }
//! ```

pub mod bridge;
pub mod build_info;
pub mod command;
pub mod config;
pub mod envelope;
pub mod error;
pub mod schedule;
pub mod server;
pub mod session;
pub mod surface;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
