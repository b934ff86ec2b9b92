//! Page object for the grade calculator.
//!
//! [`CalculatorPage`] wraps a [`PageDriver`] with the calculator's DOM
//! contract ([`locators`]), explicit waits and failure screenshots, so that
//! test bodies read as the steps a user takes.

use crate::config::HarnessConfig;
use crate::diagnostics::Diagnostics;
use crate::driver::{ElementHandle, PageDriver, StepDirection};
use crate::interact::{choose, click_with_retry, fill, script_click, step};
use crate::locator::Locator;
use crate::result::{GradecheckError, GradecheckResult};
use crate::wait::{ElementCondition, WaitResult, Waiter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The hosted calculator
pub const CALCULATOR_URL: &str =
    "https://softekogradecalculator.netlify.app/calculator/grade-calculator";

/// Rows the page renders on first load and after a reset
pub const INITIAL_ROWS: usize = 5;

// =============================================================================
// GRADE TYPE
// =============================================================================

/// How grades are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeType {
    /// Numeric grade and weight
    #[default]
    Percentage,
    /// Letter grade from a select, and weight
    Letter,
    /// Numeric grade and maximum grade
    Points,
}

impl GradeType {
    /// Every grade type, in button order
    pub const ALL: [Self; 3] = [Self::Percentage, Self::Letter, Self::Points];

    /// Text of the selector button
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percentage => "Percentage",
            Self::Letter => "Letter",
            Self::Points => "Points",
        }
    }

    /// Value of the `type` query parameter
    #[must_use]
    pub const fn query_value(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Letter => "letter",
            Self::Points => "points",
        }
    }

    /// Grade is chosen from a `<select>`
    #[must_use]
    pub const fn uses_select(self) -> bool {
        matches!(self, Self::Letter)
    }

    /// Rows carry a maximum grade instead of a weight
    #[must_use]
    pub const fn uses_max_grade(self) -> bool {
        matches!(self, Self::Points)
    }

    /// `base` with this type preselected
    #[must_use]
    pub fn url(self, base: &str) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}type={}", self.query_value())
    }

    /// Grade type named by a URL's `type` query parameter
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.strip_prefix("type="))
            .find_map(|value| value.parse().ok())
    }
}

impl fmt::Display for GradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GradeType {
    type Err = GradecheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.query_value().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GradecheckError::InvalidGradeType { name: s.to_string() })
    }
}

// =============================================================================
// ROW DATA
// =============================================================================

/// Second numeric column of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Measure {
    /// Weight in percent
    Weight(String),
    /// Maximum achievable points
    MaxGrade(String),
}

impl Measure {
    /// The raw text
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Weight(v) | Self::MaxGrade(v) => v,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight(v) => write!(f, "weight={v}"),
            Self::MaxGrade(v) => write!(f, "max_grade={v}"),
        }
    }
}

/// One row as typed by a user
///
/// Values are text so that invalid input can be entered on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowInput {
    /// Task name
    pub task: String,
    /// Grade (number or letter)
    pub grade: String,
    /// Weight or maximum grade
    pub measure: Measure,
}

impl RowInput {
    /// A percentage or letter row
    #[must_use]
    pub fn weighted(
        task: impl Into<String>,
        grade: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            grade: grade.into(),
            measure: Measure::Weight(weight.into()),
        }
    }

    /// A points row
    #[must_use]
    pub fn with_max_grade(
        task: impl Into<String>,
        grade: impl Into<String>,
        max_grade: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            grade: grade.into(),
            measure: Measure::MaxGrade(max_grade.into()),
        }
    }
}

/// Number inputs adjusted with spin buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    /// Numeric grade
    Grade,
    /// Weight
    Weight,
}

impl NumericField {
    /// Locator of every input of this field
    #[must_use]
    pub fn locator(self) -> Locator {
        match self {
            Self::Grade => locators::grade_inputs(),
            Self::Weight => locators::weight_inputs(),
        }
    }

    /// Screenshot written when adjusting fails
    #[must_use]
    pub const fn error_screenshot(self) -> &'static str {
        match self {
            Self::Grade => "adjust_grade_error",
            Self::Weight => "adjust_weight_error",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Grade => "grade",
            Self::Weight => "weight",
        })
    }
}

/// Inputs of each column currently in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputCounts {
    /// Task inputs
    pub tasks: usize,
    /// Numeric grade inputs
    pub grades: usize,
    /// Weight inputs
    pub weights: usize,
}

// =============================================================================
// LOCATORS
// =============================================================================

/// The page's DOM contract
pub mod locators {
    use super::GradeType;
    use crate::locator::Locator;

    /// Button switching to `grade_type`
    #[must_use]
    pub fn grade_type_button(grade_type: GradeType) -> Locator {
        Locator::button_with_text(grade_type.label())
    }

    /// "+ Add new row"
    #[must_use]
    pub fn add_row_button() -> Locator {
        Locator::button_labelled("+ Add new row")
    }

    /// "Reset/Clear"
    #[must_use]
    pub fn reset_button() -> Locator {
        Locator::button_labelled("Reset/Clear")
    }

    /// Form containing the rows
    #[must_use]
    pub fn rows_form() -> Locator {
        Locator::css("form.flex.flex-col.gap-2").described_as("rows form")
    }

    /// A row, relative to the form
    #[must_use]
    pub fn rows() -> Locator {
        Locator::css("div.flex.flex-row").described_as("rows")
    }

    /// Task name inputs
    #[must_use]
    pub fn task_inputs() -> Locator {
        Locator::css("input[placeholder='e.g Assignment']").described_as("task inputs")
    }

    /// Letter grade selects
    #[must_use]
    pub fn grade_selects() -> Locator {
        Locator::css("select[name*='rows'][name*='grade']").described_as("grade selects")
    }

    /// Numeric grade inputs
    #[must_use]
    pub fn grade_inputs() -> Locator {
        Locator::css("input[name*='rows'][name*='grade']").described_as("grade inputs")
    }

    /// Weight inputs
    #[must_use]
    pub fn weight_inputs() -> Locator {
        Locator::css("input[name*='rows'][name*='weight']").described_as("weight inputs")
    }

    /// Maximum grade inputs
    #[must_use]
    pub fn max_grade_inputs() -> Locator {
        Locator::css("input[name*='rows'][name*='maxGrade']").described_as("max grade inputs")
    }

    /// Delete button of the first row
    #[must_use]
    pub fn delete_first_row_button() -> Locator {
        Locator::xpath("//div[contains(@class,'flex flex-col gap-2')]//div[1]//button[1]")
            .described_as("first row delete button")
    }

    /// Validation messages
    #[must_use]
    pub fn error_messages() -> Locator {
        Locator::css(".error-message").described_as("error messages")
    }
}

// =============================================================================
// PAGE OBJECT
// =============================================================================

/// The calculator page behind a driver
#[derive(Debug)]
pub struct CalculatorPage<D> {
    driver: D,
    waiter: Waiter,
    diagnostics: Diagnostics,
    grade_type: Option<GradeType>,
}

impl<D: PageDriver> CalculatorPage<D> {
    /// Wrap a driver with default waits and screenshots
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            waiter: Waiter::new(),
            diagnostics: Diagnostics::default(),
            grade_type: None,
        }
    }

    /// Wrap a driver with waits and screenshots taken from `config`
    #[must_use]
    pub fn from_config(driver: D, config: &HarnessConfig) -> Self {
        Self::new(driver)
            .with_waiter(Waiter::with_options(config.wait_options()))
            .with_diagnostics(Diagnostics::from(config))
    }

    /// Replace the waiter
    #[must_use]
    pub fn with_waiter(mut self, waiter: Waiter) -> Self {
        self.waiter = waiter;
        self
    }

    /// Replace the screenshot policy
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Get the driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Get the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Get the waiter
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Get the screenshot policy
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Grade type last opened or selected, if known
    pub const fn grade_type(&self) -> Option<GradeType> {
        self.grade_type
    }

    /// Screenshot and re-raise if `result` failed
    pub async fn on_failure<T>(&self, name: &str, result: GradecheckResult<T>) -> GradecheckResult<T> {
        self.diagnostics.on_failure(&self.driver, name, result).await
    }

    fn screenshot_name(&self, base: &str) -> String {
        match self.grade_type {
            Some(grade_type) => format!("{base}_{}", grade_type.query_value()),
            None => base.to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Load `url` and wait for the rows form
    ///
    /// The grade type is read from the URL the browser landed on, falling
    /// back to the requested one.
    pub async fn open(&mut self, url: &str) -> GradecheckResult<()> {
        self.driver.navigate(url).await?;
        let landed = self.driver.current_url().await?;
        self.grade_type = GradeType::from_url(&landed).or_else(|| GradeType::from_url(url));
        self.waiter
            .for_element(&self.driver, &locators::rows_form(), ElementCondition::Present)
            .await?;
        tracing::info!(url, %landed, "opened calculator");
        Ok(())
    }

    /// Load `base` with `grade_type` preselected
    pub async fn open_with_type(&mut self, base: &str, grade_type: GradeType) -> GradecheckResult<()> {
        self.open(&grade_type.url(base)).await
    }

    /// Switch grade type with its selector button
    pub async fn select_grade_type(&mut self, grade_type: GradeType) -> GradecheckResult<()> {
        let result = script_click(
            &self.driver,
            &self.waiter,
            &locators::grade_type_button(grade_type),
        )
        .await
        .map(|_| ());
        let name = format!("select_{}_error", grade_type.query_value());
        self.on_failure(&name, result).await?;
        self.grade_type = Some(grade_type);
        tracing::info!(%grade_type, "selected grade type");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Rows currently inside the form
    pub async fn row_count(&self) -> GradecheckResult<usize> {
        let form = self
            .waiter
            .for_element(&self.driver, &locators::rows_form(), ElementCondition::Present)
            .await?;
        let rows = self
            .driver
            .find_elements_within(&form, locators::rows().selector())
            .await?;
        Ok(rows.len())
    }

    /// Wait until the form holds exactly `expected` rows
    ///
    /// The form is looked up again on every poll since a re-render may
    /// replace it.
    pub async fn wait_for_row_count(&self, expected: usize) -> GradecheckResult<usize> {
        let driver = &self.driver;
        self.waiter
            .until(format!("{expected} rows"), move || async move {
                let count = count_rows(driver).await?;
                Ok((count == expected).then_some(count))
            })
            .await
            .map(WaitResult::into_value)
    }

    /// Add a row through a script click and fill it in
    pub async fn add_row(&self, row: &RowInput) -> GradecheckResult<()> {
        let result = self.grow_rows(false).await;
        self.on_failure("failed_click", result).await?;
        tracing::info!("clicked '+ Add new row'");
        self.fill_details(row).await
    }

    /// Add a row through a native click (retried once) and fill it in
    pub async fn add_row_native(&self, row: &RowInput) -> GradecheckResult<()> {
        let result = self.grow_rows(true).await;
        self.on_failure("failed_click", result).await?;
        tracing::info!("clicked '+ Add new row'");
        self.fill_details(row).await
    }

    async fn grow_rows(&self, native: bool) -> GradecheckResult<()> {
        let before = self
            .driver
            .find_elements(locators::task_inputs().selector())
            .await?
            .len();
        let add = locators::add_row_button();
        if native {
            click_with_retry(&self.driver, &self.waiter, &add).await?;
        } else {
            script_click(&self.driver, &self.waiter, &add).await?;
        }
        self.waiter
            .for_count(&self.driver, &locators::task_inputs(), before + 1)
            .await?;
        Ok(())
    }

    /// Type `row` into the last row
    pub async fn fill_details(&self, row: &RowInput) -> GradecheckResult<()> {
        let result = self.try_fill_details(row).await;
        self.on_failure("data_input_error", result).await?;
        tracing::info!(task = %row.task, grade = %row.grade, measure = %row.measure, "data entered");
        Ok(())
    }

    async fn try_fill_details(&self, row: &RowInput) -> GradecheckResult<()> {
        let task = self.last(&locators::task_inputs()).await?;
        fill(&self.driver, &task, &row.task).await?;

        let selects = self
            .driver
            .find_elements(locators::grade_selects().selector())
            .await?;
        if let Some(select) = selects.last() {
            choose(&self.driver, select, &row.grade).await?;
        } else {
            let grade = self.last(&locators::grade_inputs()).await?;
            fill(&self.driver, &grade, &row.grade).await?;
        }

        let measure = match &row.measure {
            Measure::Weight(_) => self.last(&locators::weight_inputs()).await?,
            Measure::MaxGrade(_) => self.last(&locators::max_grade_inputs()).await?,
        };
        fill(&self.driver, &measure, row.measure.value()).await
    }

    /// Values of the last row, read back from the page
    pub async fn last_row(&self) -> GradecheckResult<RowInput> {
        let task = self.last(&locators::task_inputs()).await?;
        let selects = self
            .driver
            .find_elements(locators::grade_selects().selector())
            .await?;
        let grade = match selects.last() {
            Some(select) => select.clone(),
            None => self.last(&locators::grade_inputs()).await?,
        };
        let weights = self
            .driver
            .find_elements(locators::weight_inputs().selector())
            .await?;
        let measure = match weights.last() {
            Some(weight) => Measure::Weight(self.driver.value(weight).await?),
            None => {
                let max_grade = self.last(&locators::max_grade_inputs()).await?;
                Measure::MaxGrade(self.driver.value(&max_grade).await?)
            }
        };
        Ok(RowInput {
            task: self.driver.value(&task).await?,
            grade: self.driver.value(&grade).await?,
            measure,
        })
    }

    /// Click "Reset/Clear", retrying once on interception or staleness
    pub async fn reset(&self) -> GradecheckResult<()> {
        self.reset_as(&self.screenshot_name("failed_reset_click"))
            .await
    }

    /// [`reset`](Self::reset), saving a failure screenshot as `screenshot`
    pub async fn reset_as(&self, screenshot: &str) -> GradecheckResult<()> {
        let result = click_with_retry(&self.driver, &self.waiter, &locators::reset_button()).await;
        self.on_failure(screenshot, result).await?;
        tracing::info!("clicked 'Reset/Clear'");
        Ok(())
    }

    /// Reset if the button can be clicked; failures are only logged
    pub async fn clear_all_rows(&self) {
        match click_with_retry(&self.driver, &self.waiter, &locators::reset_button()).await {
            Ok(()) => tracing::info!("cleared all rows"),
            Err(e) => tracing::info!(error = %e, "nothing cleared"),
        }
    }

    /// Delete the first row
    pub async fn delete_first_row(&self) -> GradecheckResult<()> {
        let result = script_click(
            &self.driver,
            &self.waiter,
            &locators::delete_first_row_button(),
        )
        .await
        .map(|_| ());
        self.on_failure("delete_button_error", result).await?;
        tracing::info!("deleted first row");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Fields
    // -------------------------------------------------------------------------

    /// Press a spin button of row `index` and return the new value
    pub async fn adjust(
        &self,
        field: NumericField,
        index: usize,
        direction: StepDirection,
        clicks: u32,
    ) -> GradecheckResult<String> {
        let result = async {
            let input = self.nth(&field.locator(), index).await?;
            step(&self.driver, &input, direction, clicks).await?;
            self.driver.value(&input).await
        }
        .await;
        let value = self.on_failure(field.error_screenshot(), result).await?;
        tracing::debug!(%field, index, ?direction, clicks, %value, "adjusted");
        Ok(value)
    }

    /// Current value of a numeric field in row `index`
    pub async fn field_value(&self, field: NumericField, index: usize) -> GradecheckResult<String> {
        let input = self.nth(&field.locator(), index).await?;
        self.driver.value(&input).await
    }

    /// Clear a numeric field in row `index` and type `text`; returns what the page kept
    pub async fn set_field(
        &self,
        field: NumericField,
        index: usize,
        text: &str,
    ) -> GradecheckResult<String> {
        let input = self.nth(&field.locator(), index).await?;
        fill(&self.driver, &input, text).await?;
        self.driver.value(&input).await
    }

    /// Whether a numeric field of row `index` holds a value within its `min`/`max`
    ///
    /// Empty values and missing bounds count as in range.
    pub async fn field_in_range(&self, field: NumericField, index: usize) -> GradecheckResult<bool> {
        let input = self.nth(&field.locator(), index).await?;
        let number = |text: Option<String>| text.and_then(|t| t.trim().parse::<f64>().ok());
        let Some(value) = number(self.driver.attribute(&input, "value").await?) else {
            return Ok(true);
        };
        let min = number(self.driver.attribute(&input, "min").await?);
        let max = number(self.driver.attribute(&input, "max").await?);
        let below = matches!(min, Some(min) if value < min);
        let above = matches!(max, Some(max) if value > max);
        Ok(!below && !above)
    }

    /// Task name in row `index`
    pub async fn task_value(&self, index: usize) -> GradecheckResult<String> {
        let input = self.nth(&locators::task_inputs(), index).await?;
        self.driver.value(&input).await
    }

    /// Clear the task name in row `index` and type `text`; returns what the page kept
    pub async fn set_task(&self, index: usize, text: &str) -> GradecheckResult<String> {
        let input = self.nth(&locators::task_inputs(), index).await?;
        fill(&self.driver, &input, text).await?;
        self.driver.value(&input).await
    }

    /// Task, grade and weight inputs on the page
    pub async fn input_counts(&self) -> GradecheckResult<InputCounts> {
        Ok(InputCounts {
            tasks: self.count(&locators::task_inputs()).await?,
            grades: self.count(&locators::grade_inputs()).await?,
            weights: self.count(&locators::weight_inputs()).await?,
        })
    }

    /// Validation messages currently displayed
    pub async fn visible_error_count(&self) -> GradecheckResult<usize> {
        let messages = self
            .driver
            .find_elements(locators::error_messages().selector())
            .await?;
        let mut visible = 0;
        for message in &messages {
            if self.driver.element_state(message).await?.displayed {
                visible += 1;
            }
        }
        Ok(visible)
    }

    /// Wait for a validation message to be displayed
    pub async fn wait_for_error_message(&self) -> GradecheckResult<usize> {
        self.waiter
            .for_element(&self.driver, &locators::error_messages(), ElementCondition::Visible)
            .await?;
        self.visible_error_count().await
    }

    /// Close the browser
    pub async fn quit(&mut self) -> GradecheckResult<()> {
        self.driver.quit().await
    }

    async fn count(&self, locator: &Locator) -> GradecheckResult<usize> {
        Ok(self.driver.find_elements(locator.selector()).await?.len())
    }

    async fn last(&self, locator: &Locator) -> GradecheckResult<ElementHandle> {
        self.driver
            .find_elements(locator.selector())
            .await?
            .pop()
            .ok_or_else(|| GradecheckError::ElementNotFound {
                locator: locator.to_string(),
            })
    }

    async fn nth(&self, locator: &Locator, index: usize) -> GradecheckResult<ElementHandle> {
        self.driver
            .find_elements(locator.selector())
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| GradecheckError::ElementNotFound {
                locator: format!("{locator} #{index}"),
            })
    }
}

async fn count_rows<D>(driver: &D) -> GradecheckResult<usize>
where
    D: PageDriver + ?Sized,
{
    let form = driver
        .find_elements(locators::rows_form().selector())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| GradecheckError::ElementNotFound {
            locator: locators::rows_form().to_string(),
        })?;
    Ok(driver
        .find_elements_within(&form, locators::rows().selector())
        .await?
        .len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::FakeCalculator;
    use crate::wait::WaitOptions;
    use tempfile::TempDir;

    fn page(dir: &TempDir) -> CalculatorPage<FakeCalculator> {
        CalculatorPage::new(FakeCalculator::new())
            .with_waiter(Waiter::with_options(
                WaitOptions::new().with_timeout(300).with_poll_interval(10),
            ))
            .with_diagnostics(Diagnostics::new(dir.path()))
    }

    mod grade_type_tests {
        use super::*;

        #[test]
        fn test_parse_case_insensitive() {
            assert_eq!("Letter".parse::<GradeType>().unwrap(), GradeType::Letter);
            assert_eq!(" POINTS ".parse::<GradeType>().unwrap(), GradeType::Points);
            let err = "weighted".parse::<GradeType>().unwrap_err();
            assert!(matches!(err, GradecheckError::InvalidGradeType { ref name } if name == "weighted"));
        }

        #[test]
        fn test_url_round_trip() {
            let url = GradeType::Letter.url(CALCULATOR_URL);
            assert!(url.ends_with("/grade-calculator?type=letter"));
            assert_eq!(GradeType::from_url(&url), Some(GradeType::Letter));
            assert_eq!(GradeType::from_url(CALCULATOR_URL), None);
            assert_eq!(
                GradeType::Points.url("http://localhost/calc?lang=en"),
                "http://localhost/calc?lang=en&type=points"
            );
        }

        #[test]
        fn test_columns() {
            assert!(GradeType::Letter.uses_select());
            assert!(!GradeType::Points.uses_select());
            assert!(GradeType::Points.uses_max_grade());
            assert_eq!(GradeType::Percentage.to_string(), "Percentage");
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_grade_type_button() {
            assert_eq!(
                locators::grade_type_button(GradeType::Points).selector().as_str(),
                "//button[contains(text(), 'Points')]"
            );
        }

        #[test]
        fn test_numeric_field_locators() {
            assert_eq!(NumericField::Grade.locator(), locators::grade_inputs());
            assert_eq!(NumericField::Weight.error_screenshot(), "adjust_weight_error");
        }
    }

    mod page_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_tracks_grade_type() {
            let dir = TempDir::new().unwrap();
            let mut page = page(&dir);
            page.open_with_type(CALCULATOR_URL, GradeType::Points)
                .await
                .unwrap();
            assert_eq!(page.grade_type(), Some(GradeType::Points));
            assert_eq!(page.row_count().await.unwrap(), INITIAL_ROWS);
        }

        #[tokio::test]
        async fn test_add_row_fills_last_row() {
            let dir = TempDir::new().unwrap();
            let page = page(&dir);
            page.add_row(&RowInput::weighted("Exam", "85", "30"))
                .await
                .unwrap();
            assert_eq!(page.row_count().await.unwrap(), 6);
            assert_eq!(
                page.last_row().await.unwrap(),
                RowInput::weighted("Exam", "85", "30")
            );
        }

        #[tokio::test]
        async fn test_add_row_waits_for_slow_render() {
            let dir = TempDir::new().unwrap();
            let page = page(&dir);
            page.driver().set_row_delay(3);
            page.add_row(&RowInput::weighted("Quiz", "90", "10"))
                .await
                .unwrap();
            assert_eq!(page.task_value(5).await.unwrap(), "Quiz");
        }

        #[tokio::test]
        async fn test_points_row_uses_max_grade() {
            let dir = TempDir::new().unwrap();
            let mut page = page(&dir);
            page.select_grade_type(GradeType::Points).await.unwrap();
            page.add_row(&RowInput::with_max_grade("Task 2", "75", "90"))
                .await
                .unwrap();
            assert_eq!(
                page.last_row().await.unwrap(),
                RowInput::with_max_grade("Task 2", "75", "90")
            );
        }

        #[tokio::test]
        async fn test_weight_row_on_points_page_fails_with_screenshot() {
            let dir = TempDir::new().unwrap();
            let mut page = page(&dir);
            page.select_grade_type(GradeType::Points).await.unwrap();
            let err = page
                .add_row(&RowInput::weighted("Exam", "85", "30"))
                .await
                .unwrap_err();
            assert!(matches!(err, GradecheckError::ElementNotFound { .. }));
            assert!(dir.path().join("data_input_error.png").exists());
        }

        #[tokio::test]
        async fn test_failed_reset_screenshot_names_grade_type() {
            let dir = TempDir::new().unwrap();
            let mut page = page(&dir);
            page.select_grade_type(GradeType::Letter).await.unwrap();
            page.driver().intercept_next_clicks(2);
            assert!(page.reset().await.is_err());
            assert!(dir.path().join("failed_reset_click_letter.png").exists());
        }

        #[tokio::test]
        async fn test_reset_as_uses_given_screenshot_name() {
            let dir = TempDir::new().unwrap();
            let mut page = page(&dir);
            page.select_grade_type(GradeType::Points).await.unwrap();
            page.driver().intercept_next_clicks(2);
            assert!(page.reset_as("failed_reset_click_cycle_2").await.is_err());
            assert!(dir.path().join("failed_reset_click_cycle_2.png").exists());
            assert!(!dir.path().join("failed_reset_click_points.png").exists());
        }

        #[tokio::test]
        async fn test_field_in_range_reads_min_and_max() {
            let dir = TempDir::new().unwrap();
            let page = page(&dir);
            page.driver().set_number_clamping(false);
            page.add_row(&RowInput::weighted("Exam", "85", "30"))
                .await
                .unwrap();
            assert!(page.field_in_range(NumericField::Grade, 0).await.unwrap());

            for typed in ["150", "-10"] {
                let kept = page.set_field(NumericField::Grade, 0, typed).await.unwrap();
                assert_eq!(kept, typed);
                assert!(!page.field_in_range(NumericField::Grade, 0).await.unwrap());
            }

            page.set_field(NumericField::Weight, 0, "").await.unwrap();
            assert!(page.field_in_range(NumericField::Weight, 0).await.unwrap());
        }

        #[tokio::test]
        async fn test_clear_all_rows_swallows_failure() {
            let dir = TempDir::new().unwrap();
            let page = page(&dir);
            page.add_row(&RowInput::weighted("Exam", "85", "30"))
                .await
                .unwrap();
            page.driver().intercept_next_clicks(2);
            page.clear_all_rows().await;
            assert_eq!(page.row_count().await.unwrap(), 6);
            page.clear_all_rows().await;
            assert_eq!(page.row_count().await.unwrap(), INITIAL_ROWS);
        }

        #[tokio::test]
        async fn test_adjust_missing_row_screenshots() {
            let dir = TempDir::new().unwrap();
            let page = page(&dir);
            let err = page
                .adjust(NumericField::Grade, 40, StepDirection::Up, 1)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("grade inputs #40"));
            assert!(dir.path().join("adjust_grade_error.png").exists());
        }

        #[tokio::test]
        async fn test_input_counts() {
            let dir = TempDir::new().unwrap();
            let page = page(&dir);
            assert_eq!(
                page.input_counts().await.unwrap(),
                InputCounts {
                    tasks: 5,
                    grades: 5,
                    weights: 5
                }
            );
        }
    }
}
