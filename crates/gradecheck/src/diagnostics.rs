//! Failure screenshots.
//!
//! Wrap a fallible step with [`Diagnostics::on_failure`]: success passes
//! through untouched, an error is logged, a PNG of the page is written to the
//! artifacts directory and the original error is returned.

use crate::driver::PageDriver;
use crate::result::GradecheckResult;
use std::path::{Path, PathBuf};

/// Default directory for failure screenshots
pub const DEFAULT_ARTIFACTS_DIR: &str = "target/gradecheck";

/// Screenshot capture policy
#[derive(Debug, Clone)]
pub struct Diagnostics {
    artifacts_dir: PathBuf,
    enabled: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACTS_DIR)
    }
}

impl Diagnostics {
    /// Capture screenshots into `artifacts_dir`
    #[must_use]
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            enabled: true,
        }
    }

    /// Never capture anything
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            enabled: false,
        }
    }

    /// Get the artifacts directory
    #[must_use]
    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Whether screenshots are captured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path a screenshot called `name` is written to
    #[must_use]
    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(format!("{}.png", sanitize(name)))
    }

    /// Save a screenshot of the current page as `<dir>/<name>.png`
    pub async fn capture<D>(&self, driver: &D, name: &str) -> GradecheckResult<PathBuf>
    where
        D: PageDriver + ?Sized,
    {
        let shot = driver.screenshot().await?;
        tokio::fs::create_dir_all(&self.artifacts_dir).await?;
        let path = self.screenshot_path(name);
        tokio::fs::write(&path, &shot.data).await?;
        tracing::info!(path = %path.display(), bytes = shot.size_bytes(), "saved screenshot");
        Ok(path)
    }

    /// Screenshot and re-raise when `result` is an error
    ///
    /// A failed capture is logged and never replaces the original error.
    pub async fn on_failure<D, T>(
        &self,
        driver: &D,
        name: &str,
        result: GradecheckResult<T>,
    ) -> GradecheckResult<T>
    where
        D: PageDriver + ?Sized,
    {
        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        tracing::error!(step = name, error = %error, "step failed");
        if self.enabled {
            if let Err(capture_error) = self.capture(driver, name).await {
                tracing::warn!(step = name, error = %capture_error, "could not save failure screenshot");
            }
        }
        Err(error)
    }
}

/// Keep screenshot names to a safe file-name alphabet
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl From<&crate::config::HarnessConfig> for Diagnostics {
    fn from(config: &crate::config::HarnessConfig) -> Self {
        if config.screenshots {
            Self::new(&config.artifacts_dir)
        } else {
            Self::disabled()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::FakeCalculator;
    use crate::result::GradecheckError;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("select_Points_error"), "select_points_error");
        assert_eq!(sanitize("row count/cycle 1"), "row_count_cycle_1");
    }

    #[test]
    fn test_screenshot_path() {
        let diagnostics = Diagnostics::new("/tmp/shots");
        assert_eq!(
            diagnostics.screenshot_path("failed_click"),
            PathBuf::from("/tmp/shots/failed_click.png")
        );
    }

    #[tokio::test]
    async fn test_capture_writes_png() {
        let dir = TempDir::new().unwrap();
        let diagnostics = Diagnostics::new(dir.path().join("nested"));
        let page = FakeCalculator::new();

        let path = diagnostics.capture(&page, "initial").await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_on_failure_passes_success_through() {
        let dir = TempDir::new().unwrap();
        let diagnostics = Diagnostics::new(dir.path());
        let page = FakeCalculator::new();

        let value = diagnostics.on_failure(&page, "ok", Ok(3)).await.unwrap();
        assert_eq!(value, 3);
        assert!(!diagnostics.screenshot_path("ok").exists());
    }

    #[tokio::test]
    async fn test_on_failure_screenshots_and_reraises() {
        let dir = TempDir::new().unwrap();
        let diagnostics = Diagnostics::new(dir.path());
        let page = FakeCalculator::new();

        let result: GradecheckResult<()> =
            Err(GradecheckError::assertion("Expected 8 rows but found 7"));
        let err = diagnostics
            .on_failure(&page, "row_count_error_cycle_1", result)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: Expected 8 rows but found 7"
        );
        assert!(diagnostics
            .screenshot_path("row_count_error_cycle_1")
            .exists());
    }

    #[tokio::test]
    async fn test_capture_failure_keeps_original_error() {
        let dir = TempDir::new().unwrap();
        let diagnostics = Diagnostics::new(dir.path());
        let page = FakeCalculator::new();
        page.fail_screenshots(true);

        let result: GradecheckResult<()> = Err(GradecheckError::Timeout {
            waited_for: "reset".into(),
            ms: 10,
        });
        let err = diagnostics
            .on_failure(&page, "failed_reset_click", result)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(!diagnostics.screenshot_path("failed_reset_click").exists());
    }

    #[tokio::test]
    async fn test_disabled_never_writes() {
        let page = FakeCalculator::new();
        let diagnostics = Diagnostics::disabled();
        let result: GradecheckResult<()> = Err(GradecheckError::assertion("x"));
        assert!(diagnostics.on_failure(&page, "x", result).await.is_err());
        assert!(!diagnostics.is_enabled());
    }
}
