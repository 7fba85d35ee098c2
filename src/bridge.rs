//! The externally callable feedback operation.
//!
//! One call in, exactly one response out. The bridge validates inputs before
//! allocating anything, loads project settings, wires the session to its
//! surface and (optionally) the project command runner, waits for the state
//! machine to resolve, and persists whatever settings the human changed.

use crate::command::CommandRunner;
use crate::config::{project_key, ConfigStore, ProjectConfig};
use crate::envelope::{FeedbackRequest, FeedbackResponse};
use crate::error::{BridgeError, RequestError};
use crate::session::Session;
use crate::surface::FeedbackSurface;
use crate::textutil::truncate_preview;
use std::sync::Arc;

/// Run one feedback session to resolution.
///
/// Guarantees exactly one well-formed [`FeedbackResponse`] per call; elapsed
/// time alone never produces an error. Store trouble degrades to defaults.
/// Only invalid inputs and surface presentation failures surface as errors.
pub async fn run_feedback_session(
    request: FeedbackRequest,
    store: &ConfigStore,
    surface: &dyn FeedbackSurface,
    runner: Option<Arc<dyn CommandRunner>>,
) -> Result<FeedbackResponse, BridgeError> {
    validate_request(&request)?;
    let project = project_key(&request.project_directory);
    let config = store.load(&project);
    tracing::debug!(
        project = %project,
        task = %request.task_id,
        summary = %truncate_preview(&request.summary, 80),
        "feedback session starting"
    );

    let (session, handle) = Session::new(request, config.clone());

    // Auto-execute runs concurrently with the dialog; the session only sees
    // the final captured log text.
    if config.auto_execute {
        if let (Some(runner), Some(command)) = (runner, effective_command(&session, &config)) {
            let logs = handle.clone();
            let cwd = session.request().project_directory.clone();
            tokio::spawn(async move {
                match runner.run(&command, &cwd).await {
                    Ok(output) => logs.append_log(output.log),
                    Err(e) => logs.append_log(format!("failed to run `{command}`: {e}\n")),
                }
            });
        }
    }

    surface
        .present(session.request(), &config, handle)
        .await
        .map_err(BridgeError::Surface)?;

    let outcome = session.run(store).await;
    if let Some(edit) = outcome.config_edit {
        if let Err(e) = store.save(&project, &edit) {
            tracing::warn!("failed to persist settings for {project}: {e}");
        }
    }
    tracing::debug!(resolution = ?outcome.resolution, "feedback session closed");
    Ok(outcome.response)
}

/// Reject bad inputs before any session resource exists.
fn validate_request(request: &FeedbackRequest) -> Result<(), RequestError> {
    let dir = &request.project_directory;
    let metadata = std::fs::metadata(dir)
        .map_err(|e| RequestError::InvalidProjectDirectory(format!("{}: {e}", dir.display())))?;
    if !metadata.is_dir() {
        return Err(RequestError::InvalidProjectDirectory(format!(
            "{}: not a directory",
            dir.display()
        )));
    }
    std::fs::read_dir(dir)
        .map_err(|e| RequestError::InvalidProjectDirectory(format!("{}: {e}", dir.display())))?;
    if request.summary.trim().is_empty() {
        return Err(RequestError::EmptySummary);
    }
    Ok(())
}

/// Command to auto-execute: the per-request override, else the saved one.
fn effective_command(session: &Session, config: &ProjectConfig) -> Option<String> {
    session
        .request()
        .command
        .as_deref()
        .map(str::trim)
        .filter(|command| !command.is_empty())
        .or_else(|| Some(config.command.trim()).filter(|command| !command.is_empty()))
        .map(str::to_string)
}
