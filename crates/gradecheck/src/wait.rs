//! Wait Mechanisms
//!
//! Bounded polling for asynchronous DOM updates, in the manner of an explicit
//! `WebDriverWait`: check, sleep for the poll interval, check again, until the
//! check yields a value or the timeout elapses.
//!
//! Lookups that fail because an element is missing or has gone stale count as
//! "not yet" and keep polling; every other error aborts the wait.

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::Locator;
use crate::result::{GradecheckError, GradecheckResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value the check produced
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of checks made
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

impl<T> WaitResult<T> {
    /// Discard the metadata
    pub fn into_value(self) -> T {
        self.value
    }
}

// =============================================================================
// ELEMENT CONDITIONS
// =============================================================================

/// Expected state of the first element matching a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCondition {
    /// Attached to the DOM
    Present,
    /// Attached and displayed
    Visible,
    /// Displayed and enabled
    Clickable,
}

impl ElementCondition {
    /// Short description for logs and timeout errors
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
        }
    }
}

impl std::fmt::Display for ElementCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Waiter for synchronization operations
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `check` until it yields `Some`
    ///
    /// The check runs at least once, even with a zero timeout.
    pub async fn until<T, F, Fut>(
        &self,
        waited_for: impl Into<String>,
        mut check: F,
    ) -> GradecheckResult<WaitResult<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GradecheckResult<Option<T>>>,
    {
        let waited_for = waited_for.into();
        let start = Instant::now();
        let timeout = self.options.timeout();
        let mut polls = 0;

        loop {
            polls += 1;
            match check().await {
                Ok(Some(value)) => {
                    tracing::trace!(waited_for = %waited_for, polls, "wait satisfied");
                    return Ok(WaitResult {
                        value,
                        elapsed: start.elapsed(),
                        polls,
                        waited_for,
                    });
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    tracing::trace!(waited_for = %waited_for, error = %e, "ignoring transient error");
                }
                Err(e) => return Err(e),
            }

            if start.elapsed() >= timeout {
                break;
            }
            tokio::time::sleep(self.options.poll_interval()).await;
        }

        tracing::debug!(waited_for = %waited_for, polls, "wait timed out");
        Err(GradecheckError::Timeout {
            waited_for,
            ms: self.options.timeout_ms,
        })
    }

    /// Wait for the first element matching `locator` to satisfy `condition`
    pub async fn for_element<D>(
        &self,
        driver: &D,
        locator: &Locator,
        condition: ElementCondition,
    ) -> GradecheckResult<ElementHandle>
    where
        D: PageDriver + ?Sized,
    {
        let selector = locator.selector();
        self.until(format!("{locator} to be {condition}"), move || async move {
            let Some(first) = driver.find_elements(selector).await?.into_iter().next() else {
                return Ok(None);
            };
            let ready = match condition {
                ElementCondition::Present => true,
                ElementCondition::Visible => driver.element_state(&first).await?.displayed,
                ElementCondition::Clickable => {
                    driver.element_state(&first).await?.is_clickable()
                }
            };
            Ok(ready.then_some(first))
        })
        .await
        .map(WaitResult::into_value)
    }

    /// Wait until at least one element matches `locator`
    pub async fn for_elements<D>(
        &self,
        driver: &D,
        locator: &Locator,
    ) -> GradecheckResult<Vec<ElementHandle>>
    where
        D: PageDriver + ?Sized,
    {
        let selector = locator.selector();
        self.until(format!("{locator} to be present"), move || async move {
            let found = driver.find_elements(selector).await?;
            Ok((!found.is_empty()).then_some(found))
        })
        .await
        .map(WaitResult::into_value)
    }

    /// Wait until exactly `expected` elements match `locator` in the document
    pub async fn for_count<D>(
        &self,
        driver: &D,
        locator: &Locator,
        expected: usize,
    ) -> GradecheckResult<usize>
    where
        D: PageDriver + ?Sized,
    {
        let selector = locator.selector();
        self.until(format!("{expected} x {locator}"), move || async move {
            let count = driver.find_elements(selector).await?.len();
            Ok((count == expected).then_some(count))
        })
        .await
        .map(WaitResult::into_value)
    }

    /// Wait until exactly `expected` elements match `locator` beneath `parent`
    pub async fn for_count_within<D>(
        &self,
        driver: &D,
        parent: &ElementHandle,
        locator: &Locator,
        expected: usize,
    ) -> GradecheckResult<usize>
    where
        D: PageDriver + ?Sized,
    {
        let selector = locator.selector();
        self.until(format!("{expected} x {locator}"), move || async move {
            let count = driver.find_elements_within(parent, selector).await?.len();
            Ok((count == expected).then_some(count))
        })
        .await
        .map(WaitResult::into_value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
