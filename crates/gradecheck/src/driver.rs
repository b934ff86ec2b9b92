//! PageDriver - Abstract Browser Automation Trait
//!
//! Every page interaction goes through [`PageDriver`], which keeps the page
//! object, waits and retry logic independent of the browser backend.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  PageDriver (Abstract Trait)                                  │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐          ┌─────────────────────┐     │
//! │  │  ChromiumDriver     │          │  FakeCalculator     │     │
//! │  │  (feature browser)  │          │  (offline tests)    │     │
//! │  │  CDP via            │          │  in-memory model    │     │
//! │  │  chromiumoxide      │          │  of the page        │     │
//! │  └─────────────────────┘          └─────────────────────┘     │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Selector;
use crate::result::GradecheckResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle to an element found by a driver
///
/// The id is opaque and only meaningful to the driver that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
    /// Lowercase tag name captured at lookup time
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into().to_ascii_lowercase(),
        }
    }

    /// Check if this is a `<select>` element
    #[must_use]
    pub fn is_select(&self) -> bool {
        self.tag_name == "select"
    }
}

/// Interactability of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementState {
    /// Rendered with a non-empty box and not hidden by CSS
    pub displayed: bool,
    /// Not disabled
    pub enabled: bool,
}

impl ElementState {
    /// Displayed and enabled
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.displayed && self.enabled
    }
}

/// Alignment for `scrollIntoView`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    /// `scrollIntoView(true)`
    Start,
    /// `scrollIntoView({block: 'center'})`
    Center,
}

impl ScrollAlign {
    /// Argument passed to `Element.scrollIntoView`
    #[must_use]
    pub const fn js_argument(self) -> &'static str {
        match self {
            Self::Start => "true",
            Self::Center => "{block: 'center'}",
        }
    }
}

/// Direction for number-input spin buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    /// `stepUp()`
    Up,
    /// `stepDown()`
    Down,
}

impl StepDirection {
    /// DOM method name
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Up => "stepUp",
            Self::Down => "stepDown",
        }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: std::time::SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the data starts with the PNG signature
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.data.starts_with(&[0x89, b'P', b'N', b'G'])
    }
}

/// Abstract driver trait for browser automation
///
/// Lookups return every match in document order; an empty vector is not an
/// error. Operations on a handle whose node has gone fail with
/// [`GradecheckError::StaleElement`](crate::GradecheckError::StaleElement).
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> GradecheckResult<()>;

    /// Get current URL
    async fn current_url(&self) -> GradecheckResult<String>;

    /// All elements matching a selector
    async fn find_elements(&self, selector: &Selector) -> GradecheckResult<Vec<ElementHandle>>;

    /// All elements matching a selector beneath `parent`
    async fn find_elements_within(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> GradecheckResult<Vec<ElementHandle>>;

    /// Visibility and enabled state
    async fn element_state(&self, element: &ElementHandle) -> GradecheckResult<ElementState>;

    /// Native click
    ///
    /// Fails with `ClickIntercepted` when another element would receive it.
    async fn click(&self, element: &ElementHandle) -> GradecheckResult<()>;

    /// Click through `HTMLElement.click()`, bypassing hit-testing
    async fn js_click(&self, element: &ElementHandle) -> GradecheckResult<()>;

    /// Scroll element into view
    async fn scroll_into_view(
        &self,
        element: &ElementHandle,
        align: ScrollAlign,
    ) -> GradecheckResult<()>;

    /// Clear an input's value
    async fn clear(&self, element: &ElementHandle) -> GradecheckResult<()>;

    /// Type text into an element
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> GradecheckResult<()>;

    /// Current `value` property
    async fn value(&self, element: &ElementHandle) -> GradecheckResult<String>;

    /// Attribute value, `None` when absent
    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> GradecheckResult<Option<String>>;

    /// Invoke a number input's spin button once
    async fn step(&self, element: &ElementHandle, direction: StepDirection) -> GradecheckResult<()>;

    /// Take screenshot
    async fn screenshot(&self) -> GradecheckResult<Screenshot>;

    /// Close the browser session
    async fn quit(&mut self) -> GradecheckResult<()>;
}
