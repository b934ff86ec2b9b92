//! Harness configuration
//!
//! Defaults, then an optional YAML file, then environment variables; later
//! sources override earlier ones.

use crate::calculator::{GradeType, CALCULATOR_URL};
use crate::diagnostics::DEFAULT_ARTIFACTS_DIR;
use crate::result::{GradecheckError, GradecheckResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Page under test
pub const ENV_URL: &str = "GRADECHECK_URL";
/// `true`/`false`
pub const ENV_HEADLESS: &str = "GRADECHECK_HEADLESS";
/// Chromium executable
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";
/// `true`/`false`
pub const ENV_NO_SANDBOX: &str = "GRADECHECK_NO_SANDBOX";
/// Explicit wait timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "GRADECHECK_TIMEOUT_MS";
/// Directory for failure screenshots
pub const ENV_ARTIFACTS: &str = "GRADECHECK_ARTIFACTS";

/// Configuration for a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Calculator URL without query
    pub base_url: String,
    /// Grade type preselected through `?type=`
    pub grade_type: Option<GradeType>,
    /// Run the browser without a window
    pub headless: bool,
    /// Chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Disable the Chromium sandbox (containers/CI)
    pub no_sandbox: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Explicit wait timeout
    pub wait_timeout_ms: u64,
    /// Explicit wait poll interval
    pub poll_interval_ms: u64,
    /// Where failure screenshots go
    pub artifacts_dir: PathBuf,
    /// Capture screenshots on failure
    pub screenshots: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: CALCULATOR_URL.to_string(),
            grade_type: None,
            headless: true,
            chromium_path: None,
            no_sandbox: false,
            viewport_width: 1366,
            viewport_height: 900,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            screenshots: true,
        }
    }
}

impl HarnessConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> GradecheckResult<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> GradecheckResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> GradecheckResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: &Path) -> GradecheckResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Override fields from variables returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> GradecheckResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.base_url = url;
        }
        if let Some(value) = lookup(ENV_HEADLESS) {
            self.headless = parse_bool(ENV_HEADLESS, &value)?;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.chromium_path = Some(path);
        }
        if let Some(value) = lookup(ENV_NO_SANDBOX) {
            self.no_sandbox = parse_bool(ENV_NO_SANDBOX, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.wait_timeout_ms = value.trim().parse().map_err(|_| {
                GradecheckError::config(format!("{ENV_TIMEOUT_MS} must be milliseconds, got '{value}'"))
            })?;
        }
        if let Some(dir) = lookup(ENV_ARTIFACTS) {
            self.artifacts_dir = PathBuf::from(dir);
        }
        self.validate()
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> GradecheckResult<()> {
        if !(self.base_url.starts_with("http://")
            || self.base_url.starts_with("https://")
            || self.base_url.starts_with("file://"))
        {
            return Err(GradecheckError::config(format!(
                "base_url must be an http(s) or file URL, got '{}'",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(GradecheckError::config("poll_interval_ms must be positive"));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(GradecheckError::config("viewport must be non-empty"));
        }
        Ok(())
    }

    /// Set the grade type query
    #[must_use]
    pub const fn with_grade_type(mut self, grade_type: GradeType) -> Self {
        self.grade_type = Some(grade_type);
        self
    }

    /// URL the session opens
    #[must_use]
    pub fn start_url(&self) -> String {
        match self.grade_type {
            Some(grade_type) => grade_type.url(&self.base_url),
            None => self.base_url.clone(),
        }
    }

    /// Explicit wait options
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> GradecheckResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GradecheckError::config(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, CALCULATOR_URL);
        assert!(config.headless);
        assert_eq!(config.wait_timeout_ms, 10_000);
        assert_eq!(config.start_url(), CALCULATOR_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_start_url_with_grade_type() {
        let config = HarnessConfig::default().with_grade_type(GradeType::Letter);
        assert_eq!(
            config.start_url(),
            format!("{CALCULATOR_URL}?type=letter")
        );
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = HarnessConfig::from_yaml(
            "headless: false\ngrade_type: points\nwait_timeout_ms: 2500\n",
        )
        .unwrap();
        assert!(!config.headless);
        assert_eq!(config.grade_type, Some(GradeType::Points));
        assert_eq!(config.wait_options().timeout_ms, 2500);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_yaml_rejects_bad_url() {
        let err = HarnessConfig::from_yaml("base_url: calculator.local\n").unwrap_err();
        assert!(matches!(err, GradecheckError::Config { .. }));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gradecheck.yaml");
        std::fs::write(&path, "no_sandbox: true\nartifacts_dir: shots\n").unwrap();
        let config = HarnessConfig::from_yaml_file(&path).unwrap();
        assert!(config.no_sandbox);
        assert_eq!(config.artifacts_dir, PathBuf::from("shots"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = HarnessConfig::default();
        config
            .apply_env(env(&[
                (ENV_URL, "http://localhost:3000/calculator/grade-calculator"),
                (ENV_HEADLESS, "no"),
                (ENV_CHROMIUM_PATH, "/usr/bin/chromium"),
                (ENV_TIMEOUT_MS, "1500"),
                (ENV_ARTIFACTS, "/tmp/gc"),
            ]))
            .unwrap();
        assert_eq!(
            config.base_url,
            "http://localhost:3000/calculator/grade-calculator"
        );
        assert!(!config.headless);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(config.wait_timeout_ms, 1500);
        assert_eq!(config.artifacts_dir, PathBuf::from("/tmp/gc"));
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = HarnessConfig::default();
        let err = config
            .apply_env(env(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_MS));

        let err = config
            .apply_env(env(&[(ENV_NO_SANDBOX, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_NO_SANDBOX));
    }
}
