//! In-memory calculator page for offline tests.
//!
//! [`FakeCalculator`] implements [`PageDriver`] over a small model of the
//! calculator's DOM: the rows form, its rows and their inputs, the add,
//! reset, delete and grade-type buttons, and validation messages. It resolves
//! exactly the selectors in [`locators`]; anything else matches nothing.
//!
//! Faults can be injected to exercise waits and retries:
//!
//! ```rust,ignore
//! let page = FakeCalculator::new();
//! page.intercept_next_clicks(1); // the next native click hits an overlay
//! page.set_row_delay(3);         // new rows render after three lookups
//! ```

pub mod inputs;

use crate::calculator::{locators, GradeType, INITIAL_ROWS};
use crate::config::HarnessConfig;
use crate::driver::{
    ElementHandle, ElementState, PageDriver, Screenshot, ScrollAlign, StepDirection,
};
use crate::locator::Selector;
use crate::result::{GradecheckError, GradecheckResult};
use crate::session::Launcher;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Element that covers the page when a click is intercepted
pub const OVERLAY: &str = "div.sticky.top-0";

// PNG signature followed by an empty IEND chunk
const FAKE_PNG: [u8; 20] = [
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE,
    0x42, 0x60, 0x82,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Task,
    Grade,
    Measure,
}

impl Column {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Grade => "grade",
            Self::Measure => "measure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Form,
    Row(u64),
    Input(u64, Column),
    Delete(u64),
    Error(u64),
    AddButton,
    ResetButton,
    TypeButton(GradeType),
}

impl Node {
    fn id(self) -> String {
        match self {
            Self::Form => "form".into(),
            Self::Row(row) => format!("row-{row}"),
            Self::Input(row, column) => format!("{}-{row}", column.as_str()),
            Self::Delete(row) => format!("delete-{row}"),
            Self::Error(row) => format!("error-{row}"),
            Self::AddButton => "add".into(),
            Self::ResetButton => "reset".into(),
            Self::TypeButton(grade_type) => format!("type-{}", grade_type.query_value()),
        }
    }

    fn parse(id: &str) -> Option<Self> {
        match id {
            "form" => return Some(Self::Form),
            "add" => return Some(Self::AddButton),
            "reset" => return Some(Self::ResetButton),
            _ => {}
        }
        let (kind, rest) = id.split_once('-')?;
        if kind == "type" {
            return rest.parse().ok().map(Self::TypeButton);
        }
        let row = rest.parse().ok()?;
        Some(match kind {
            "row" => Self::Row(row),
            "task" => Self::Input(row, Column::Task),
            "grade" => Self::Input(row, Column::Grade),
            "measure" => Self::Input(row, Column::Measure),
            "delete" => Self::Delete(row),
            "error" => Self::Error(row),
            _ => return None,
        })
    }

    const fn row(self) -> Option<u64> {
        match self {
            Self::Row(row) | Self::Input(row, _) | Self::Delete(row) | Self::Error(row) => {
                Some(row)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Row {
    id: u64,
    task: String,
    grade: String,
    measure: String,
    grade_invalid: bool,
    measure_invalid: bool,
}

impl Row {
    const fn has_error(&self) -> bool {
        self.grade_invalid || self.measure_invalid
    }
}

#[derive(Debug)]
struct PageState {
    url: String,
    grade_type: GradeType,
    rows: Vec<Row>,
    next_row: u64,
    pending_rows: Vec<u32>,
    row_delay: u32,
    intercept_clicks: u32,
    stale_clicks: u32,
    native_clicks: u32,
    add_hidden: bool,
    add_disabled: bool,
    fail_screenshots: bool,
    clamp_numbers: bool,
    closed: bool,
    history: Vec<String>,
}

impl PageState {
    fn new() -> Self {
        let mut state = Self {
            url: "about:blank".into(),
            grade_type: GradeType::default(),
            rows: Vec::new(),
            next_row: 0,
            pending_rows: Vec::new(),
            row_delay: 0,
            intercept_clicks: 0,
            stale_clicks: 0,
            native_clicks: 0,
            add_hidden: false,
            add_disabled: false,
            fail_screenshots: false,
            clamp_numbers: true,
            closed: false,
            history: Vec::new(),
        };
        state.initial_rows();
        state
    }

    fn new_row(&mut self) -> Row {
        self.next_row += 1;
        Row {
            id: self.next_row,
            ..Row::default()
        }
    }

    /// Replace every row with fresh ones; old handles go stale
    fn initial_rows(&mut self) {
        self.pending_rows.clear();
        let rows = (0..INITIAL_ROWS).map(|_| self.new_row()).collect();
        self.rows = rows;
    }

    fn add_row(&mut self) {
        if self.row_delay == 0 {
            let row = self.new_row();
            self.rows.push(row);
        } else {
            self.pending_rows.push(self.row_delay);
        }
    }

    /// Let pending rows render; called on every lookup
    fn tick(&mut self) {
        let mut ready = 0;
        self.pending_rows.retain_mut(|polls| {
            if *polls <= 1 {
                ready += 1;
                false
            } else {
                *polls -= 1;
                true
            }
        });
        for _ in 0..ready {
            let row = self.new_row();
            self.rows.push(row);
        }
    }

    fn row(&self, id: u64) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    fn row_mut(&mut self, id: u64) -> GradecheckResult<&mut Row> {
        self.rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GradecheckError::StaleElement {
                element: Node::Row(id).id(),
            })
    }

    fn input_value(&self, id: u64, column: Column) -> Option<String> {
        self.row(id).map(|row| match column {
            Column::Task => row.task.clone(),
            Column::Grade => row.grade.clone(),
            Column::Measure => row.measure.clone(),
        })
    }

    fn row_index(&self, id: u64) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    fn exists(&self, node: Node) -> bool {
        match node {
            Node::Error(id) => self.row(id).is_some_and(Row::has_error),
            other => match other.row() {
                Some(id) => self.row(id).is_some(),
                None => true,
            },
        }
    }

    /// Node behind a handle, or `StaleElement` once it has been removed
    fn resolve(&self, element: &ElementHandle) -> GradecheckResult<Node> {
        Node::parse(&element.id)
            .filter(|node| self.exists(*node))
            .ok_or_else(|| GradecheckError::StaleElement {
                element: element.id.clone(),
            })
    }

    fn tag(&self, node: Node) -> &'static str {
        match node {
            Node::Form => "form",
            Node::Row(_) => "div",
            Node::Input(_, Column::Grade) if self.grade_type.uses_select() => "select",
            Node::Input(..) => "input",
            Node::Error(_) => "p",
            Node::Delete(_) | Node::AddButton | Node::ResetButton | Node::TypeButton(_) => {
                "button"
            }
        }
    }

    fn handle(&self, node: Node) -> ElementHandle {
        ElementHandle::new(node.id(), self.tag(node))
    }

    fn each_row(&self, node: impl Fn(u64) -> Node) -> Vec<Node> {
        self.rows.iter().map(|r| node(r.id)).collect()
    }

    /// Nodes a selector matches, in document order
    fn query(&self, selector: &Selector) -> Vec<Node> {
        let grade_type = self.grade_type;
        let input = |column| self.each_row(|id| Node::Input(id, column));

        if selector == locators::rows_form().selector() {
            vec![Node::Form]
        } else if selector == locators::rows().selector() {
            self.each_row(Node::Row)
        } else if selector == locators::task_inputs().selector() {
            input(Column::Task)
        } else if selector == locators::grade_selects().selector() {
            if grade_type.uses_select() {
                input(Column::Grade)
            } else {
                Vec::new()
            }
        } else if selector == locators::grade_inputs().selector() {
            if grade_type.uses_select() {
                Vec::new()
            } else {
                input(Column::Grade)
            }
        } else if selector == locators::weight_inputs().selector() {
            if grade_type.uses_max_grade() {
                Vec::new()
            } else {
                input(Column::Measure)
            }
        } else if selector == locators::max_grade_inputs().selector() {
            if grade_type.uses_max_grade() {
                input(Column::Measure)
            } else {
                Vec::new()
            }
        } else if selector == locators::add_row_button().selector() {
            vec![Node::AddButton]
        } else if selector == locators::reset_button().selector() {
            vec![Node::ResetButton]
        } else if selector == locators::delete_first_row_button().selector() {
            self.rows.first().map(|r| Node::Delete(r.id)).into_iter().collect()
        } else if selector == locators::error_messages().selector() {
            self.rows
                .iter()
                .filter(|r| r.has_error())
                .map(|r| Node::Error(r.id))
                .collect()
        } else {
            GradeType::ALL
                .into_iter()
                .find(|t| locators::grade_type_button(*t).selector() == selector)
                .map(Node::TypeButton)
                .into_iter()
                .collect()
        }
    }

    fn activate(&mut self, node: Node) {
        match node {
            Node::AddButton if !self.add_disabled => self.add_row(),
            Node::ResetButton => self.initial_rows(),
            Node::TypeButton(grade_type) => {
                self.grade_type = grade_type;
                self.initial_rows();
            }
            Node::Delete(id) => self.rows.retain(|r| r.id != id),
            _ => {}
        }
    }

    fn is_select(&self, node: Node) -> bool {
        matches!(node, Node::Input(_, Column::Grade)) && self.grade_type.uses_select()
    }

    fn not_an_input(&self, node: Node) -> GradecheckError {
        GradecheckError::InputError {
            message: format!("{} is a <{}>, not an input", node.id(), self.tag(node)),
        }
    }
}

/// In-memory [`PageDriver`] modelling the grade calculator
///
/// Clones share one page, so a test can keep a handle for inspection while a
/// session owns the driver.
#[derive(Debug, Clone)]
pub struct FakeCalculator {
    state: Arc<Mutex<PageState>>,
}

impl Default for FakeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCalculator {
    /// A freshly loaded percentage page with five empty rows
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rows rendered in the form
    pub fn row_count(&self) -> usize {
        self.state().rows.len()
    }

    /// Active grade type
    pub fn grade_type(&self) -> GradeType {
        self.state().grade_type
    }

    /// Task names, top to bottom
    pub fn task_names(&self) -> Vec<String> {
        self.state().rows.iter().map(|r| r.task.clone()).collect()
    }

    /// Native clicks attempted so far, including intercepted ones
    pub fn native_clicks(&self) -> u32 {
        self.state().native_clicks
    }

    /// Commands received, oldest first
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// `quit` was called
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// The next `n` native clicks land on an overlay
    pub fn intercept_next_clicks(&self, n: u32) {
        self.state().intercept_clicks = n;
    }

    /// The next `n` native clicks find their element detached
    pub fn stale_next_clicks(&self, n: u32) {
        self.state().stale_clicks = n;
    }

    /// New rows render only after `lookups` further element lookups
    pub fn set_row_delay(&self, lookups: u32) {
        self.state().row_delay = lookups;
    }

    /// Hide the add button
    pub fn set_add_button_hidden(&self, hidden: bool) {
        self.state().add_hidden = hidden;
    }

    /// Disable the add button
    pub fn set_add_button_disabled(&self, disabled: bool) {
        self.state().add_disabled = disabled;
    }

    /// Make every screenshot fail
    pub fn fail_screenshots(&self, fail: bool) {
        self.state().fail_screenshots = fail;
    }

    /// Clamp typed numbers into 0..=100 (the default)
    ///
    /// When off, number inputs keep out-of-range values as typed, the way a
    /// browser's `<input type="number" min max>` does.
    pub fn set_number_clamping(&self, clamp: bool) {
        self.state().clamp_numbers = clamp;
    }
}

#[async_trait]
impl PageDriver for FakeCalculator {
    async fn navigate(&mut self, url: &str) -> GradecheckResult<()> {
        if !["http://", "https://", "file://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            return Err(GradecheckError::NavigationError {
                url: url.to_string(),
                message: "unsupported scheme".into(),
            });
        }
        let mut state = self.state();
        state.history.push(format!("navigate:{url}"));
        state.url = url.to_string();
        state.grade_type = GradeType::from_url(url).unwrap_or_default();
        state.closed = false;
        state.initial_rows();
        Ok(())
    }

    async fn current_url(&self) -> GradecheckResult<String> {
        Ok(self.state().url.clone())
    }

    async fn find_elements(&self, selector: &Selector) -> GradecheckResult<Vec<ElementHandle>> {
        let mut state = self.state();
        state.tick();
        let nodes = state.query(selector);
        Ok(nodes.into_iter().map(|n| state.handle(n)).collect())
    }

    async fn find_elements_within(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> GradecheckResult<Vec<ElementHandle>> {
        let mut state = self.state();
        state.tick();
        let parent = state.resolve(parent)?;
        let nodes = match parent {
            Node::Form => state.query(selector),
            Node::Row(id) => state
                .query(selector)
                .into_iter()
                .filter(|n| *n != Node::Row(id) && n.row() == Some(id))
                .collect(),
            _ => Vec::new(),
        };
        Ok(nodes.into_iter().map(|n| state.handle(n)).collect())
    }

    async fn element_state(&self, element: &ElementHandle) -> GradecheckResult<ElementState> {
        let state = self.state();
        let node = state.resolve(element)?;
        let is_add = node == Node::AddButton;
        Ok(ElementState {
            displayed: !(is_add && state.add_hidden),
            enabled: !(is_add && state.add_disabled),
        })
    }

    async fn click(&self, element: &ElementHandle) -> GradecheckResult<()> {
        let mut state = self.state();
        let node = state.resolve(element)?;
        state.native_clicks += 1;
        state.history.push(format!("click:{}", element.id));
        if state.intercept_clicks > 0 {
            state.intercept_clicks -= 1;
            return Err(GradecheckError::ClickIntercepted {
                element: element.id.clone(),
                obscured_by: OVERLAY.into(),
            });
        }
        if state.stale_clicks > 0 {
            state.stale_clicks -= 1;
            return Err(GradecheckError::StaleElement {
                element: element.id.clone(),
            });
        }
        state.activate(node);
        Ok(())
    }

    async fn js_click(&self, element: &ElementHandle) -> GradecheckResult<()> {
        let mut state = self.state();
        let node = state.resolve(element)?;
        state.history.push(format!("js_click:{}", element.id));
        state.activate(node);
        Ok(())
    }

    async fn scroll_into_view(
        &self,
        element: &ElementHandle,
        align: ScrollAlign,
    ) -> GradecheckResult<()> {
        let mut state = self.state();
        state.resolve(element)?;
        let align = match align {
            ScrollAlign::Start => "start",
            ScrollAlign::Center => "center",
        };
        state.history.push(format!("scroll:{align}:{}", element.id));
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> GradecheckResult<()> {
        let mut state = self.state();
        let node = state.resolve(element)?;
        if state.is_select(node) {
            return Err(GradecheckError::InputError {
                message: format!("{} is a <select> and cannot be cleared", element.id),
            });
        }
        let Node::Input(id, column) = node else {
            return Err(state.not_an_input(node));
        };
        let row = state.row_mut(id)?;
        match column {
            Column::Task => row.task.clear(),
            Column::Grade => {
                row.grade.clear();
                row.grade_invalid = false;
            }
            Column::Measure => {
                row.measure.clear();
                row.measure_invalid = false;
            }
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> GradecheckResult<()> {
        let mut state = self.state();
        let node = state.resolve(element)?;
        let is_select = state.is_select(node);
        let number: fn(&str) -> Option<String> = if state.clamp_numbers {
            inputs::sanitize_number
        } else {
            inputs::unclamped_number
        };
        let Node::Input(id, column) = node else {
            return Err(state.not_an_input(node));
        };
        let row = state.row_mut(id)?;
        match column {
            Column::Task => row.task.push_str(text),
            Column::Grade if is_select => match inputs::choose_letter(text) {
                Some(letter) => {
                    row.grade = letter.to_string();
                    row.grade_invalid = false;
                }
                None => row.grade_invalid = true,
            },
            Column::Grade => {
                let typed = format!("{}{text}", row.grade);
                match number(&typed) {
                    Some(value) => {
                        row.grade = value;
                        row.grade_invalid = false;
                    }
                    None => {
                        row.grade.clear();
                        row.grade_invalid = true;
                    }
                }
            }
            Column::Measure => {
                let typed = format!("{}{text}", row.measure);
                match number(&typed) {
                    Some(value) => {
                        row.measure = value;
                        row.measure_invalid = false;
                    }
                    None => {
                        row.measure.clear();
                        row.measure_invalid = true;
                    }
                }
            }
        }
        Ok(())
    }

    async fn value(&self, element: &ElementHandle) -> GradecheckResult<String> {
        let state = self.state();
        let node = state.resolve(element)?;
        let Node::Input(id, column) = node else {
            return Err(state.not_an_input(node));
        };
        state
            .input_value(id, column)
            .ok_or_else(|| GradecheckError::StaleElement {
                element: element.id.clone(),
            })
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> GradecheckResult<Option<String>> {
        let state = self.state();
        let node = state.resolve(element)?;
        let max_grade = state.grade_type.uses_max_grade();
        let value = match (node, name) {
            (Node::Input(id, column), "value") => state.input_value(id, column),
            (Node::Input(id, column), "name") => state.row_index(id).map(|index| {
                let field = match column {
                    Column::Task => "name",
                    Column::Grade => "grade",
                    Column::Measure if max_grade => "maxGrade",
                    Column::Measure => "weight",
                };
                format!("rows.{index}.{field}")
            }),
            (Node::Input(_, Column::Task), "placeholder") => Some("e.g Assignment".into()),
            (Node::Input(_, Column::Task), "type") => Some("text".into()),
            (Node::Input(..), "type") if !state.is_select(node) => Some("number".into()),
            (Node::Input(..), "min") if !state.is_select(node) => Some("0".into()),
            (Node::Input(..), "max") if !state.is_select(node) => Some("100".into()),
            (Node::Form, "class") => Some("flex flex-col gap-2".into()),
            (Node::Row(_), "class") => Some("flex flex-row gap-2".into()),
            (Node::Error(_), "class") => Some("error-message".into()),
            _ => None,
        };
        Ok(value)
    }

    async fn step(&self, element: &ElementHandle, direction: StepDirection) -> GradecheckResult<()> {
        let mut state = self.state();
        let node = state.resolve(element)?;
        let unsupported = || GradecheckError::InputError {
            message: format!("{}() is not supported on {}", direction.method(), element.id),
        };
        if state.is_select(node) {
            return Err(unsupported());
        }
        let Node::Input(id, column) = node else {
            return Err(unsupported());
        };
        let row = state.row_mut(id)?;
        match column {
            Column::Task => return Err(unsupported()),
            Column::Grade => row.grade = inputs::stepped(&row.grade, direction),
            Column::Measure => row.measure = inputs::stepped(&row.measure, direction),
        }
        state.history.push(format!("{}:{}", direction.method(), element.id));
        Ok(())
    }

    async fn screenshot(&self) -> GradecheckResult<Screenshot> {
        let mut state = self.state();
        if state.fail_screenshots {
            return Err(GradecheckError::ScreenshotError {
                message: "capture failed".into(),
            });
        }
        state.history.push("screenshot".into());
        Ok(Screenshot::new(FAKE_PNG.to_vec()))
    }

    async fn quit(&mut self) -> GradecheckResult<()> {
        let mut state = self.state();
        state.history.push("quit".into());
        state.closed = true;
        Ok(())
    }
}

/// [`Launcher`] handing out clones of one [`FakeCalculator`]
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    page: FakeCalculator,
}

impl FakeLauncher {
    /// Launch sessions on `page`
    #[must_use]
    pub fn new(page: FakeCalculator) -> Self {
        Self { page }
    }

    /// The shared page
    pub fn page(&self) -> &FakeCalculator {
        &self.page
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Driver = FakeCalculator;

    async fn launch(&self, config: &HarnessConfig) -> GradecheckResult<FakeCalculator> {
        tracing::debug!(url = %config.start_url(), "launching fake calculator");
        Ok(self.page.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    async fn first(page: &FakeCalculator, locator: crate::locator::Locator) -> ElementHandle {
        page.find_elements(locator.selector())
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_node_ids_parse_back() {
        for node in [
            Node::Form,
            Node::Row(3),
            Node::Input(7, Column::Measure),
            Node::Delete(1),
            Node::Error(2),
            Node::AddButton,
            Node::TypeButton(GradeType::Letter),
        ] {
            assert_eq!(Node::parse(&node.id()), Some(node));
        }
        assert_eq!(Node::parse("bogus-1"), None);
    }

    mod layout_tests {
        use super::*;

        #[tokio::test]
        async fn test_initial_page() {
            let page = FakeCalculator::new();
            assert_eq!(page.row_count(), 5);
            let grades = page
                .find_elements(locators::grade_inputs().selector())
                .await
                .unwrap();
            assert_eq!(grades.len(), 5);
            assert!(page
                .find_elements(locators::grade_selects().selector())
                .await
                .unwrap()
                .is_empty());
            assert!(page
                .find_elements(&Selector::css("div.unknown"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn test_navigate_with_type_query() {
            let mut page = FakeCalculator::new();
            page.navigate("https://calc.test/grade-calculator?type=letter")
                .await
                .unwrap();
            assert_eq!(page.grade_type(), GradeType::Letter);
            let selects = page
                .find_elements(locators::grade_selects().selector())
                .await
                .unwrap();
            assert_eq!(selects.len(), 5);
            assert!(selects[0].is_select());
        }

        #[tokio::test]
        async fn test_navigate_rejects_bad_scheme() {
            let mut page = FakeCalculator::new();
            let err = page.navigate("calc.test").await.unwrap_err();
            assert!(matches!(err, GradecheckError::NavigationError { .. }));
        }

        #[tokio::test]
        async fn test_points_has_max_grade_not_weight() {
            let page = FakeCalculator::new();
            let button = first(&page, locators::grade_type_button(GradeType::Points)).await;
            page.js_click(&button).await.unwrap();
            assert!(page
                .find_elements(locators::weight_inputs().selector())
                .await
                .unwrap()
                .is_empty());
            let max = first(&page, locators::max_grade_inputs()).await;
            assert_eq!(
                page.attribute(&max, "name").await.unwrap().as_deref(),
                Some("rows.0.maxGrade")
            );
        }

        #[tokio::test]
        async fn test_rows_within_form() {
            let page = FakeCalculator::new();
            let form = first(&page, locators::rows_form()).await;
            let rows = page
                .find_elements_within(&form, locators::rows().selector())
                .await
                .unwrap();
            assert_eq!(rows.len(), 5);
            let inputs = page
                .find_elements_within(&rows[1], locators::task_inputs().selector())
                .await
                .unwrap();
            assert_eq!(inputs.len(), 1);
        }
    }

    mod row_tests {
        use super::*;

        #[tokio::test]
        async fn test_reset_makes_handles_stale() {
            let page = FakeCalculator::new();
            let task = first(&page, locators::task_inputs()).await;
            let reset = first(&page, locators::reset_button()).await;
            page.click(&reset).await.unwrap();
            let err = page.value(&task).await.unwrap_err();
            assert!(matches!(err, GradecheckError::StaleElement { .. }));
        }

        #[tokio::test]
        async fn test_delete_first_row() {
            let page = FakeCalculator::new();
            let tasks = page
                .find_elements(locators::task_inputs().selector())
                .await
                .unwrap();
            page.send_keys(&tasks[1], "second").await.unwrap();
            let delete = first(&page, locators::delete_first_row_button()).await;
            page.js_click(&delete).await.unwrap();
            assert_eq!(page.row_count(), 4);
            assert_eq!(page.task_names()[0], "second");
        }

        #[tokio::test]
        async fn test_delayed_row_appears_after_lookups() {
            let page = FakeCalculator::new();
            page.set_row_delay(2);
            let add = first(&page, locators::add_row_button()).await;
            page.js_click(&add).await.unwrap();
            assert_eq!(page.row_count(), 5);
            let _ = page.find_elements(locators::rows().selector()).await.unwrap();
            assert_eq!(page.row_count(), 5);
            let _ = page.find_elements(locators::rows().selector()).await.unwrap();
            assert_eq!(page.row_count(), 6);
        }
    }

    mod input_tests {
        use super::*;

        #[tokio::test]
        async fn test_number_input_rejects_text_and_shows_error() {
            let page = FakeCalculator::new();
            let weight = first(&page, locators::weight_inputs()).await;
            page.send_keys(&weight, "abc").await.unwrap();
            assert_eq!(page.value(&weight).await.unwrap(), "");
            let errors = page
                .find_elements(locators::error_messages().selector())
                .await
                .unwrap();
            assert_eq!(errors.len(), 1);
            assert!(page.element_state(&errors[0]).await.unwrap().displayed);

            page.clear(&weight).await.unwrap();
            page.send_keys(&weight, "20").await.unwrap();
            assert!(page
                .find_elements(locators::error_messages().selector())
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn test_select_rejects_unknown_letter() {
            let mut page = FakeCalculator::new();
            page.navigate("https://calc.test/?type=letter").await.unwrap();
            let select = first(&page, locators::grade_selects()).await;
            page.send_keys(&select, "B+").await.unwrap();
            assert_eq!(page.value(&select).await.unwrap(), "B+");
            page.send_keys(&select, "Invalid Grade").await.unwrap();
            assert_eq!(page.value(&select).await.unwrap(), "B+");
            assert!(page.clear(&select).await.is_err());
            assert_eq!(
                page.find_elements(locators::error_messages().selector())
                    .await
                    .unwrap()
                    .len(),
                1
            );
        }

        #[tokio::test]
        async fn test_step_on_task_input_fails() {
            let page = FakeCalculator::new();
            let task = first(&page, locators::task_inputs()).await;
            let err = page.step(&task, StepDirection::Up).await.unwrap_err();
            assert!(err.to_string().contains("stepUp()"));
        }

        #[tokio::test]
        async fn test_screenshot_is_png() {
            let page = FakeCalculator::new();
            assert!(page.screenshot().await.unwrap().is_png());
            page.fail_screenshots(true);
            assert!(page.screenshot().await.is_err());
        }
    }
}
