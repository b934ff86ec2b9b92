//! Gradecheck: browser end-to-end checks for the Softeko grade calculator
//!
//! The calculator is a React page whose rows form changes shape with the
//! selected grade type (percentage, letter, points). Gradecheck drives it
//! through a [`PageDriver`], waits for the DOM instead of sleeping, retries
//! clicks that land on overlays or replaced nodes, and writes a screenshot
//! whenever a step fails.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    GRADECHECK Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │    │ Calculator │    │ PageDriver │            │
//! │   │ (Rust)     │───►│ Page       │───►│ chromium / │            │
//! │   │            │    │ Object     │    │ fake page  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │              │      │                                 │
//! │         ▼              ▼      ▼                                 │
//! │   ┌────────────┐  ┌────────┐ ┌─────────────┐                    │
//! │   │ Session    │  │ Waiter │ │ Diagnostics │                    │
//! │   │ (Launcher) │  │        │ │ (PNG)       │                    │
//! │   └────────────┘  └────────┘ └─────────────┘                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::FutureExt;
//! use gradecheck::{run_scenario, scenarios, ChromiumLauncher, GradeType, HarnessConfig};
//!
//! let config = HarnessConfig::load(None)?.with_grade_type(GradeType::Letter);
//! let rows = scenarios::letter_rows();
//! let outcome = run_scenario(&ChromiumLauncher, &config, "letter rows", move |page| {
//!     async move { scenarios::grade_type_add_and_reset(page, GradeType::Letter, &rows).await }
//!         .boxed()
//! })
//! .await;
//! assert!(outcome.passed, "{:?}", outcome.error);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod calculator;
mod config;
mod diagnostics;
mod driver;
mod interact;
mod locator;
mod result;
mod session;

/// Tracing subscriber setup
pub mod logging;

/// In-memory calculator page for offline tests
///
/// Implements [`PageDriver`] without a browser, with fault injection for
/// overlays, stale nodes and slow renders.
pub mod mock;

/// End-to-end checks of the calculator
pub mod scenarios;

/// Explicit waits
pub mod wait;

pub use browser::{BrowserConfig, ELEMENT_ID_ATTRIBUTE};
#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumLauncher};
pub use calculator::{
    locators, CalculatorPage, GradeType, InputCounts, Measure, NumericField, RowInput,
    CALCULATOR_URL, INITIAL_ROWS,
};
pub use config::{
    HarnessConfig, ENV_ARTIFACTS, ENV_CHROMIUM_PATH, ENV_HEADLESS, ENV_NO_SANDBOX, ENV_TIMEOUT_MS,
    ENV_URL,
};
pub use diagnostics::{Diagnostics, DEFAULT_ARTIFACTS_DIR};
pub use driver::{ElementHandle, ElementState, PageDriver, Screenshot, ScrollAlign, StepDirection};
pub use interact::{choose, click_with_retry, fill, script_click, step};
pub use locator::{Locator, Selector};
pub use result::{ensure_eq, GradecheckError, GradecheckResult};
pub use session::{run_scenario, CalculatorSession, Launcher, ScenarioOutcome};
pub use wait::{
    ElementCondition, WaitOptions, WaitResult, Waiter, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::mock::{FakeCalculator, FakeLauncher};
    pub use super::{
        ensure_eq, run_scenario, scenarios, CalculatorPage, CalculatorSession, GradeType,
        GradecheckError, GradecheckResult, HarnessConfig, Launcher, Locator, Measure,
        NumericField, PageDriver, RowInput, ScenarioOutcome,
    };
    #[cfg(feature = "browser")]
    pub use super::{ChromiumDriver, ChromiumLauncher};
}
