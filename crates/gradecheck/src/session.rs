//! One browser session per test.
//!
//! A [`Launcher`] creates the driver, [`CalculatorSession`] opens the page
//! and closes it again, and [`run_scenario`] wraps both around a test body so
//! the browser is quit whether the body passed or not.

use crate::calculator::CalculatorPage;
use crate::config::HarnessConfig;
use crate::driver::PageDriver;
use crate::result::GradecheckResult;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Creates the driver a session runs on
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Driver type produced
    type Driver: PageDriver;

    /// Start a driver configured from `config`
    async fn launch(&self, config: &HarnessConfig) -> GradecheckResult<Self::Driver>;
}

/// An open calculator page that must be finished
#[derive(Debug)]
pub struct CalculatorSession<D> {
    page: CalculatorPage<D>,
    started: Instant,
}

impl<D: PageDriver> CalculatorSession<D> {
    /// Launch a driver and open the configured URL
    ///
    /// The driver is quit again if the page cannot be opened.
    pub async fn start_with<L>(launcher: &L, config: &HarnessConfig) -> GradecheckResult<Self>
    where
        L: Launcher<Driver = D>,
    {
        let started = Instant::now();
        let driver = launcher.launch(config).await?;
        let mut page = CalculatorPage::from_config(driver, config);
        if let Err(e) = page.open(&config.start_url()).await {
            if let Err(quit_error) = page.quit().await {
                tracing::warn!(error = %quit_error, "could not quit after failed open");
            }
            return Err(e);
        }
        Ok(Self { page, started })
    }

    /// The open page
    pub const fn page(&self) -> &CalculatorPage<D> {
        &self.page
    }

    /// The open page, mutably
    pub fn page_mut(&mut self) -> &mut CalculatorPage<D> {
        &mut self.page
    }

    /// Quit the driver; returns how long the session lasted
    pub async fn finish(mut self) -> GradecheckResult<Duration> {
        self.page.quit().await?;
        Ok(self.started.elapsed())
    }
}

#[cfg(feature = "browser")]
impl CalculatorSession<crate::browser::ChromiumDriver> {
    /// Launch Chromium and open the configured URL
    pub async fn start(config: &HarnessConfig) -> GradecheckResult<Self> {
        Self::start_with(&crate::browser::ChromiumLauncher, config).await
    }
}

/// Result of one scenario run
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub name: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Wall time including browser start and shutdown
    pub duration: Duration,
}

impl ScenarioOutcome {
    /// Create a passing outcome
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// Create a failing outcome
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            duration: Duration::ZERO,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Start a session, run `body` on its page, finish the session
///
/// The session is finished even when `body` fails; a body failure takes
/// precedence over a failure to quit.
pub async fn run_scenario<L, F>(
    launcher: &L,
    config: &HarnessConfig,
    name: &str,
    body: F,
) -> ScenarioOutcome
where
    L: Launcher,
    F: for<'a> FnOnce(&'a mut CalculatorPage<L::Driver>) -> BoxFuture<'a, GradecheckResult<()>>,
{
    let started = Instant::now();
    let result = async {
        let mut session = CalculatorSession::start_with(launcher, config).await?;
        let outcome = body(session.page_mut()).await;
        let finished = session.finish().await;
        outcome.and(finished.map(|_| ()))
    }
    .instrument(tracing::info_span!("scenario", name))
    .await;

    let outcome = match result {
        Ok(()) => {
            tracing::info!(scenario = name, "passed");
            ScenarioOutcome::pass(name)
        }
        Err(e) => {
            tracing::error!(scenario = name, error = %e, "failed");
            ScenarioOutcome::fail(name, e.to_string())
        }
    };
    outcome.with_duration(started.elapsed())
}
