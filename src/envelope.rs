//! Request/response envelope for one feedback exchange.
//!
//! A [`FeedbackRequest`] is what the calling agent hands to the bridge; a
//! [`FeedbackResponse`] is what it gets back. Both are plain data: the
//! session state machine owns the request while the exchange is live and
//! hands ownership of the response to the caller at resolution.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Auto-continue text returned when the countdown fires with no submit.
///
/// The calling agent treats this as "no new instructions yet, ask again";
/// returning it keeps the agent's session alive across IDE idle timeouts.
pub const CONTINUE_SENTINEL: &str = "No user feedback arrived before the timeout. Keep the \
     session going: continue with the current plan and call the interactive_feedback tool \
     again at the next checkpoint.";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One feedback request, immutable once constructed.
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    /// Caller-chosen task identifier; may be empty.
    pub task_id: String,
    /// Project the feedback concerns. Must exist and be readable.
    pub project_directory: PathBuf,
    /// One-line summary or question shown to the human.
    pub summary: String,
    /// Optional override for the project's configured console command.
    pub command: Option<String>,
    /// Countdown before the auto-continue response is synthesized.
    pub timeout: Duration,
}

impl FeedbackRequest {
    /// Build a request with the environment-resolved default timeout.
    pub fn new(
        project_directory: impl Into<PathBuf>,
        summary: impl Into<String>,
        task_id: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            project_directory: project_directory.into(),
            summary: summary.into(),
            command: None,
            timeout: crate::schedule::default_timeout(),
        }
    }

    /// Override the console command for this request only.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Override the auto-continue countdown.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The resolved outcome of one feedback exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackResponse {
    /// User-authored text, or [`CONTINUE_SENTINEL`] on timeout.
    pub interactive_feedback: String,
    /// Validated raster attachments, in submission order.
    pub images: Vec<ImageAttachment>,
    /// Captured console output from any command run during the session.
    pub logs: String,
    /// Plan verdict when the confirm-before-execute workflow was engaged.
    ///
    /// `None` means no verdict was given this call; it serializes as an
    /// explicit `null` so the contract stays static for callers.
    pub confirmed: Option<bool>,
}

impl FeedbackResponse {
    /// Build the synthesized auto-continue response.
    pub fn auto_continue(logs: String) -> Self {
        Self {
            interactive_feedback: CONTINUE_SENTINEL.to_string(),
            images: Vec::new(),
            logs,
            confirmed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Raster formats a response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// MIME type for transport surfaces.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// Short lowercase tag used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// Image payload as submitted by a surface: base64 data plus hints.
///
/// Hints are untrusted; validation sniffs and decodes the actual bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub data: String,
}

/// A validated attachment: the bytes are known to decode as `format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl Serialize for ImageAttachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("ImageAttachment", 3)?;
        out.serialize_field("name", &self.name)?;
        out.serialize_field("mime_type", self.format.mime_type())?;
        out.serialize_field("data", &B64.encode(&self.data))?;
        out.end()
    }
}

/// Decode and validate surface-submitted images, preserving order.
///
/// Payloads that are not valid base64 or do not decode as a supported raster
/// format are dropped with a warning; one bad attachment never blocks the
/// rest of the response.
pub fn validate_images(raw: Vec<RawImage>) -> Vec<ImageAttachment> {
    let mut attachments = Vec::with_capacity(raw.len());
    for (index, image) in raw.into_iter().enumerate() {
        let name = image.name.clone();
        match validate_image(image) {
            Ok(attachment) => attachments.push(attachment),
            Err(reason) => {
                tracing::warn!("dropping image attachment #{index} ({name:?}): {reason}");
            }
        }
    }
    attachments
}

fn validate_image(raw: RawImage) -> Result<ImageAttachment, String> {
    let data = B64
        .decode(raw.data.trim())
        .map_err(|e| format!("invalid base64 payload: {e}"))?;
    if data.is_empty() {
        return Err("empty payload".to_string());
    }
    let format = match image::guess_format(&data) {
        Ok(image::ImageFormat::Png) => ImageFormat::Png,
        Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        Ok(image::ImageFormat::Gif) => ImageFormat::Gif,
        Ok(image::ImageFormat::WebP) => ImageFormat::Webp,
        Ok(other) => return Err(format!("unsupported raster format {other:?}")),
        Err(e) => return Err(format!("unrecognized image data: {e}")),
    };
    // Sniffing the magic bytes is not enough; a truncated file must not reach
    // the caller as a "valid" attachment.
    image::load_from_memory(&data)
        .map_err(|e| format!("undecodable {} data: {e}", format.as_str()))?;
    Ok(ImageAttachment {
        name: raw.name,
        format,
        data,
    })
}
