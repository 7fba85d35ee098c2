//! Unified error types for the feedback bridge.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when reading or writing the settings store.
///
/// Callers on the session path never propagate these: a store that cannot be
/// read degrades to default settings, and a failed write is logged and
/// dropped. Losing a preference is acceptable; losing the dialog is not.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Serialize(toml::ser::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Serialize(e) => write!(f, "toml serialize: {e}"),
            Self::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialize(e)
    }
}

// ---------------------------------------------------------------------------
// RequestError
// ---------------------------------------------------------------------------

/// Invalid tool inputs, rejected before any session resource is allocated.
#[derive(Debug)]
pub enum RequestError {
    /// The project directory is missing, unreadable, or not a directory.
    InvalidProjectDirectory(String),
    /// The summary was empty after trimming.
    EmptySummary,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProjectDirectory(msg) => write!(f, "invalid project directory: {msg}"),
            Self::EmptySummary => write!(f, "summary cannot be empty"),
        }
    }
}

impl std::error::Error for RequestError {}

// ---------------------------------------------------------------------------
// SurfaceError
// ---------------------------------------------------------------------------

/// Failures presenting the feedback dialog. Always fatal to the call.
#[derive(Debug)]
pub enum SurfaceError {
    /// The surface could not be created at all.
    Unavailable(String),
    /// The surface was created but failed while collecting input.
    Input(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "feedback surface unavailable: {msg}"),
            Self::Input(msg) => write!(f, "feedback surface input failed: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

// ---------------------------------------------------------------------------
// CommandError
// ---------------------------------------------------------------------------

/// Errors from the project command runner.
///
/// These never abort a session; the failure text is appended to the console
/// log instead.
#[derive(Debug)]
pub enum CommandError {
    /// The shell process could not be spawned.
    Spawn(String),
    /// The process started but its output could not be collected.
    Capture(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "failed to spawn command: {msg}"),
            Self::Capture(msg) => write!(f, "failed to capture command output: {msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

// ---------------------------------------------------------------------------
// BridgeError — top-level
// ---------------------------------------------------------------------------

/// Top-level error type for the feedback entry point.
///
/// A timeout is deliberately absent here: the countdown firing produces a
/// well-formed auto-continue response, never an error.
#[derive(Debug)]
pub enum BridgeError {
    Request(RequestError),
    Surface(SurfaceError),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request: {e}"),
            Self::Surface(e) => write!(f, "surface: {e}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<RequestError> for BridgeError {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

impl From<SurfaceError> for BridgeError {
    fn from(e: SurfaceError) -> Self {
        Self::Surface(e)
    }
}
