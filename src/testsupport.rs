//! Shared test fixtures for config/session/bridge test modules.
//!
//! Keeping tiny reusable helpers here prevents each test module from
//! rebuilding ad-hoc temp-dir, surface, and image fixture code.

use crate::config::{ConfigStore, ProjectConfig};
use crate::envelope::FeedbackRequest;
use crate::error::SurfaceError;
use crate::session::{SessionHandle, Submission};
use crate::surface::FeedbackSurface;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("holdup-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Isolated settings store backed by a fresh temp directory.
pub fn temp_store() -> (TestTempDir, ConfigStore) {
    let dir = TestTempDir::new("store");
    let store = ConfigStore::open(dir.child("settings.toml"));
    (dir, store)
}

/// Encode a 1x1 red PNG in memory.
pub fn tiny_png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    let pixel = image::Rgba([255u8, 0, 0, 255]);
    let img = image::RgbaImage::from_pixel(1, 1, pixel);
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encode");
    bytes
}

/// Base64 form of [`tiny_png_bytes`].
pub fn tiny_png_base64() -> String {
    B64.encode(tiny_png_bytes())
}

// ---------------------------------------------------------------------------
// Scripted surface
// ---------------------------------------------------------------------------

enum Script {
    /// Never produce any event; the countdown decides.
    Silent,
    /// Fail presentation outright.
    Fail(String),
    /// Submit after an optional delay.
    Submit(Duration, Submission),
    /// Stage a settings edit, then submit an empty feedback line.
    EditThenSubmit(ProjectConfig),
}

/// Surface double that plays one scripted interaction per `present` call.
pub struct ScriptedSurface {
    script: Mutex<Script>,
}

impl ScriptedSurface {
    pub fn silent() -> Self {
        Self::with(Script::Silent)
    }

    pub fn failing(reason: &str) -> Self {
        Self::with(Script::Fail(reason.to_string()))
    }

    pub fn submitting(submission: Submission) -> Self {
        Self::with(Script::Submit(Duration::from_millis(20), submission))
    }

    pub fn submitting_after(delay: Duration, submission: Submission) -> Self {
        Self::with(Script::Submit(delay, submission))
    }

    pub fn editing_then_submitting(edit: ProjectConfig) -> Self {
        Self::with(Script::EditThenSubmit(edit))
    }

    fn with(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl FeedbackSurface for ScriptedSurface {
    async fn present(
        &self,
        _request: &FeedbackRequest,
        _config: &ProjectConfig,
        session: SessionHandle,
    ) -> Result<(), SurfaceError> {
        let script = std::mem::replace(
            &mut *self.script.lock().expect("script lock"),
            Script::Silent,
        );
        match script {
            Script::Silent => {}
            Script::Fail(reason) => return Err(SurfaceError::Unavailable(reason)),
            Script::Submit(delay, submission) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    session.submit(submission);
                });
            }
            Script::EditThenSubmit(edit) => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    session.edit_config(edit);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    session.submit(Submission::default());
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[test]
    fn tiny_png_fixture_is_a_valid_png() {
        let bytes = tiny_png_bytes();
        assert_eq!(
            image::guess_format(&bytes).expect("sniff"),
            image::ImageFormat::Png
        );
        image::load_from_memory(&bytes).expect("decode");
    }
}
