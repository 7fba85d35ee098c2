//! The seam between the session core and whatever renders the dialog.
//!
//! A surface's only job is to show the request to the human and feed their
//! actions back through the [`SessionHandle`]. The crate ships a minimal
//! terminal prompt for CLI use; richer dialogs (a GUI window with image
//! paste, a command console, checkboxes) implement the same trait from the
//! outside.

use crate::config::ProjectConfig;
use crate::envelope::FeedbackRequest;
use crate::error::SurfaceError;
use crate::session::{SessionHandle, Submission};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};

/// A surface that can present one feedback request.
#[async_trait]
pub trait FeedbackSurface: Send + Sync {
    /// Present the request and start collecting input.
    ///
    /// Returns once the surface is live; the human's actions arrive on the
    /// session channel afterwards. An error here is fatal to the call.
    async fn present(
        &self,
        request: &FeedbackRequest,
        config: &ProjectConfig,
        session: SessionHandle,
    ) -> Result<(), SurfaceError>;
}

// ---------------------------------------------------------------------------
// Terminal surface
// ---------------------------------------------------------------------------

/// Line-oriented prompt on the controlling terminal.
///
/// Reads `/dev/tty` rather than stdin because stdin carries the JSON-RPC
/// wire in serve mode. Feedback is a single line; when the project has
/// confirm-before-execute enabled a second prompt collects the optional
/// plan verdict (Enter skips it on a proposal round).
pub struct TerminalSurface;

impl TerminalSurface {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackSurface for TerminalSurface {
    async fn present(
        &self,
        request: &FeedbackRequest,
        config: &ProjectConfig,
        session: SessionHandle,
    ) -> Result<(), SurfaceError> {
        let tty = Tty::open().map_err(|e| {
            SurfaceError::Unavailable(format!("cannot open controlling terminal: {e}"))
        })?;
        let job = PromptJob {
            tty,
            summary: request.summary.clone(),
            task_id: request.task_id.clone(),
            project: request.project_directory.display().to_string(),
            timeout_secs: request.timeout.as_secs(),
            want_verdict: config.confirm_before_execute,
            session,
        };
        // The prompt blocks on terminal reads; keep it off the async runtime.
        tokio::task::spawn_blocking(move || job.run());
        Ok(())
    }
}

/// Read/write handles on the controlling terminal.
struct Tty {
    reader: BufReader<File>,
    writer: File,
}

impl Tty {
    fn open() -> std::io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(File::open("/dev/tty")?),
            writer: OpenOptions::new().write(true).open("/dev/tty")?,
        })
    }

    fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.writer, "{text}")
    }

    fn prompt(&mut self, text: &str) -> std::io::Result<String> {
        write!(self.writer, "{text}")?;
        self.writer.flush()?;
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "terminal closed",
            ));
        }
        Ok(line.trim().to_string())
    }
}

struct PromptJob {
    tty: Tty,
    summary: String,
    task_id: String,
    project: String,
    timeout_secs: u64,
    want_verdict: bool,
    session: SessionHandle,
}

impl PromptJob {
    fn run(mut self) {
        match self.collect() {
            Ok(submission) => self.session.submit(submission),
            // Leave resolution to the countdown when the terminal goes away.
            Err(e) => tracing::warn!("terminal prompt aborted: {e}"),
        }
    }

    fn collect(&mut self) -> std::io::Result<Submission> {
        self.tty.write_line("")?;
        if self.task_id.is_empty() {
            self.tty.write_line(&format!("[{}]", self.project))?;
        } else {
            self.tty
                .write_line(&format!("[{} · {}]", self.project, self.task_id))?;
        }
        let summary = self.summary.clone();
        self.tty.write_line(&summary)?;
        self.tty.write_line(&format!(
            "(auto-continues in {}s if left unanswered)",
            self.timeout_secs
        ))?;
        let text = self.tty.prompt("feedback> ")?;
        let confirmed = if self.want_verdict {
            let answer = self
                .tty
                .prompt("approve the proposed plan? [y/n, Enter to skip] ")?;
            parse_verdict(&answer)
        } else {
            None
        };
        Ok(Submission {
            text,
            images: Vec::new(),
            confirmed,
        })
    }
}

/// Map a typed verdict answer; anything unrecognized means "no verdict".
fn parse_verdict(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
