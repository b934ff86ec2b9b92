//! End-to-end checks of the calculator, one function per test case.
//!
//! Every scenario drives a [`CalculatorPage`] that is already open and fails
//! with [`GradecheckError::AssertionFailed`] when the page disagrees with the
//! expected state. Row counts are polled, never slept on.

use crate::calculator::{CalculatorPage, GradeType, NumericField, RowInput, INITIAL_ROWS};
use crate::driver::{PageDriver, StepDirection};
use crate::result::{ensure_eq, GradecheckError, GradecheckResult};

/// Text a task input must keep verbatim
pub const TASK_TEXTS: [&str; 3] = ["Test123", "123456", "!@#$%^&*()"];

/// Typed grade text and the value the input must keep
pub const GRADE_TEXT_CASES: [(&str, &str); 3] = [("90", "90"), ("abc", ""), ("!@#", "")];

/// Out-of-range grades and their clamped value
///
/// An input may instead keep the typed number if it then lies outside the
/// input's `min`/`max`, which is how Chromium's number inputs behave.
pub const GRADE_RANGE_CASES: [(&str, &str); 3] = [("-10", "0"), ("150", "100"), ("-10", "0")];

// =============================================================================
// DATA SETS
// =============================================================================

/// Percentage rows: task, grade, weight
pub fn percentage_rows() -> Vec<RowInput> {
    vec![
        RowInput::weighted("Assignment", "90", "25"),
        RowInput::weighted("Exam", "85", "30"),
        RowInput::weighted("Project", "70", "15"),
    ]
}

/// Letter rows: task, letter, weight
pub fn letter_rows() -> Vec<RowInput> {
    vec![
        RowInput::weighted("Presentation", "A", "20"),
        RowInput::weighted("Quiz", "B+", "10"),
        RowInput::weighted("Report", "C", "20"),
    ]
}

/// Points rows: task, grade, max grade
pub fn points_rows() -> Vec<RowInput> {
    vec![
        RowInput::with_max_grade("Task 1", "80", "100"),
        RowInput::with_max_grade("Task 2", "75", "90"),
        RowInput::with_max_grade("Task 3", "90", "100"),
    ]
}

/// Default rows for `grade_type`
pub fn rows_for(grade_type: GradeType) -> Vec<RowInput> {
    match grade_type {
        GradeType::Percentage => percentage_rows(),
        GradeType::Letter => letter_rows(),
        GradeType::Points => points_rows(),
    }
}

/// Rows added in each add/reset cycle
pub fn cycle_rows() -> Vec<RowInput> {
    vec![
        RowInput::weighted("Homework", "80", "15"),
        RowInput::weighted("Quiz", "90", "10"),
        RowInput::weighted("Midterm", "75", "20"),
        RowInput::weighted("Final", "85", "30"),
    ]
}

/// Rows added before deleting one
pub fn delete_rows() -> Vec<RowInput> {
    vec![
        RowInput::weighted("Project", "70", "25"),
        RowInput::weighted("Lab Work", "85", "20"),
        RowInput::weighted("Term Paper", "65", "15"),
        RowInput::weighted("Presentation", "80", "25"),
    ]
}

/// Letter rows entered one per test
pub fn letter_param_rows() -> Vec<RowInput> {
    vec![
        RowInput::weighted("Homework", "A", "20"),
        RowInput::weighted("Quiz", "B+", "15"),
        RowInput::weighted("Midterm", "A-", "25"),
    ]
}

// =============================================================================
// HELPERS
// =============================================================================

/// Wait for `expected` rows; on timeout fail with `message(found)`
async fn expect_rows<D, F>(
    page: &CalculatorPage<D>,
    expected: usize,
    message: F,
) -> GradecheckResult<()>
where
    D: PageDriver,
    F: FnOnce(usize) -> String,
{
    match page.wait_for_row_count(expected).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_timeout() => {
            let found = page.row_count().await?;
            ensure_eq(&found, &expected, || message(found))
        }
        Err(e) => Err(e),
    }
}

fn parse_value(field: NumericField, value: &str) -> GradecheckResult<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| GradecheckError::assertion(format!("{field} value '{value}' is not a number")))
}

// =============================================================================
// SCENARIOS
// =============================================================================

/// Select `grade_type`, add `rows`, check the count, reset, check again
pub async fn grade_type_add_and_reset<D: PageDriver>(
    page: &mut CalculatorPage<D>,
    grade_type: GradeType,
    rows: &[RowInput],
) -> GradecheckResult<()> {
    page.select_grade_type(grade_type).await?;

    let count = page.row_count().await;
    let initial = page
        .on_failure(&format!("initial_rows_error_{}", grade_type.query_value()), count)
        .await?;
    tracing::info!(%grade_type, initial, "initial rows");

    for row in rows {
        page.add_row(row).await?;
    }

    let expected = initial + rows.len();
    expect_rows(page, expected, |found| {
        format!("Expected {expected} rows but found {found}")
    })
    .await?;
    tracing::info!(%grade_type, rows = expected, "rows after addition");

    page.reset().await?;
    expect_rows(page, initial, |found| {
        format!("Expected {initial} rows after reset for {grade_type} but got {found}")
    })
    .await?;
    tracing::info!(%grade_type, rows = initial, "rows after reset");
    Ok(())
}

/// [`grade_type_add_and_reset`] for every grade type with its default rows
pub async fn all_grade_types<D: PageDriver>(page: &mut CalculatorPage<D>) -> GradecheckResult<()> {
    for grade_type in GradeType::ALL {
        grade_type_add_and_reset(page, grade_type, &rows_for(grade_type)).await?;
    }
    Ok(())
}

/// Add `rows` and reset, `cycles` times, checking the count each time
pub async fn add_and_reset_cycles<D: PageDriver>(
    page: &mut CalculatorPage<D>,
    cycles: u32,
    rows: &[RowInput],
) -> GradecheckResult<()> {
    let count = page.row_count().await;
    let initial = page.on_failure("initial_rows_error", count).await?;

    for cycle in 1..=cycles {
        for row in rows {
            page.add_row(row).await?;
        }

        let expected = initial + rows.len();
        let added = expect_rows(page, expected, |found| {
            format!("Expected {expected} rows but found {found}")
        })
        .await;
        page.on_failure(&format!("row_count_error_cycle_{cycle}"), added)
            .await?;
        tracing::info!(cycle, rows = expected, "rows after addition");

        page.reset_as(&format!("failed_reset_click_cycle_{cycle}"))
            .await?;
        let cleared = expect_rows(page, initial, |found| {
            format!("Expected {initial} rows after reset in cycle {cycle} but got {found}")
        })
        .await;
        page.on_failure(&format!("reset_error_cycle_{cycle}"), cleared)
            .await?;
        tracing::info!(cycle, rows = initial, "rows after reset");
    }
    Ok(())
}

/// Add `rows`, delete the first row, expect one row fewer
pub async fn delete_single_row<D: PageDriver>(
    page: &mut CalculatorPage<D>,
    rows: &[RowInput],
) -> GradecheckResult<()> {
    let count = page.row_count().await;
    let initial = page.on_failure("initial_rows_error", count).await?;

    for row in rows {
        page.add_row(row).await?;
    }
    let expected = initial + rows.len();
    expect_rows(page, expected, |found| {
        format!("Expected {expected} rows but found {found}")
    })
    .await?;

    page.delete_first_row().await?;
    let remaining = expected.saturating_sub(1);
    expect_rows(page, remaining, |found| {
        format!("Expected {remaining} rows after deletion but found {found}")
    })
    .await
}

/// Spin `field` of the first row up then down; it must stay within 0..=100
pub async fn numeric_field_stays_in_range<D: PageDriver>(
    page: &mut CalculatorPage<D>,
    field: NumericField,
    up_clicks: u32,
    down_clicks: u32,
) -> GradecheckResult<()> {
    page.add_row(&RowInput::weighted("Exam", "85", "50")).await?;

    let value = page.adjust(field, 0, StepDirection::Up, up_clicks).await?;
    if parse_value(field, &value)? > 100.0 {
        return Err(GradecheckError::assertion(format!(
            "{field} rose above 100: {value}"
        )));
    }

    let value = page
        .adjust(field, 0, StepDirection::Down, down_clicks)
        .await?;
    if parse_value(field, &value)? < 0.0 {
        return Err(GradecheckError::assertion(format!(
            "{field} fell below 0: {value}"
        )));
    }
    Ok(())
}

/// Spin buttons move by one and stop at the bounds: 50, 51, 50, 100, 0
pub async fn spin_button_steps<D: PageDriver>(
    page: &mut CalculatorPage<D>,
    field: NumericField,
) -> GradecheckResult<()> {
    let task = match field {
        NumericField::Grade => "Spin Test",
        NumericField::Weight => "Weight Spin Test",
    };
    page.add_row(&RowInput::weighted(task, "50", "50")).await?;

    let initial = page.set_field(field, 0, "50").await?;
    ensure_eq(initial.as_str(), "50", || {
        format!("Initial value is not as expected: {initial}")
    })?;

    let steps = [
        (StepDirection::Up, 1, "51", "Value not increased as expected"),
        (StepDirection::Down, 1, "50", "Value not decreased as expected"),
        (StepDirection::Up, 50, "100", "Value not increased to max as expected"),
        (StepDirection::Down, 100, "0", "Value not decreased to min as expected"),
    ];
    for (direction, clicks, expected, message) in steps {
        let value = page.adjust(field, 0, direction, clicks).await?;
        ensure_eq(value.as_str(), expected, || format!("{message}: {value}"))?;
    }
    Ok(())
}

/// A fresh page has five rows and five task, grade and weight inputs
pub async fn initial_layout<D: PageDriver>(page: &mut CalculatorPage<D>) -> GradecheckResult<()> {
    let rows = page.row_count().await?;
    ensure_eq(&rows, &INITIAL_ROWS, || {
        format!("Expected {INITIAL_ROWS} initial rows but found {rows}")
    })?;

    let counts = page.input_counts().await?;
    for (column, found) in [
        ("task", counts.tasks),
        ("grade", counts.grades),
        ("weight", counts.weights),
    ] {
        ensure_eq(&found, &INITIAL_ROWS, || {
            format!("Expected {INITIAL_ROWS} {column} inputs but found {found}")
        })?;
    }
    Ok(())
}

/// Task names keep letters, digits and symbols verbatim
pub async fn task_input_accepts_any_text<D: PageDriver>(
    page: &mut CalculatorPage<D>,
) -> GradecheckResult<()> {
    page.add_row(&RowInput::weighted("Task", "50", "50")).await?;
    for text in TASK_TEXTS {
        let kept = page.set_task(0, text).await?;
        ensure_eq(kept.as_str(), text, || {
            format!("Task input kept '{kept}' instead of '{text}'")
        })?;
    }
    Ok(())
}

/// Grade inputs keep numbers and drop text; out-of-range numbers are clamped
/// or left flagged outside the input's bounds
pub async fn grade_input_validation<D: PageDriver>(
    page: &mut CalculatorPage<D>,
) -> GradecheckResult<()> {
    page.add_row(&RowInput::weighted("Grade", "50", "50")).await?;
    for (typed, expected) in GRADE_TEXT_CASES {
        let kept = page.set_field(NumericField::Grade, 0, typed).await?;
        ensure_eq(kept.as_str(), expected, || {
            format!("Grade input kept '{kept}' for '{typed}', expected '{expected}'")
        })?;
    }
    for (typed, clamped) in GRADE_RANGE_CASES {
        let kept = page.set_field(NumericField::Grade, 0, typed).await?;
        if kept == clamped {
            continue;
        }
        if kept == typed && !page.field_in_range(NumericField::Grade, 0).await? {
            tracing::info!(typed, "grade input kept an out-of-range value and flagged it");
            continue;
        }
        return Err(GradecheckError::assertion(format!(
            "Grade input kept '{kept}' for '{typed}', expected '{clamped}' or '{typed}' outside its range"
        )));
    }
    Ok(())
}

/// Add `row` on a letter page and read it back
pub async fn letter_row_entry<D: PageDriver>(
    page: &mut CalculatorPage<D>,
    row: &RowInput,
) -> GradecheckResult<()> {
    if page.grade_type() != Some(GradeType::Letter) {
        page.select_grade_type(GradeType::Letter).await?;
    }
    page.add_row_native(row).await?;
    let found = page.last_row().await?;
    ensure_eq(&found, row, || {
        format!("Expected last row {row:?} but found {found:?}")
    })
}

/// Nonsense in every column of a letter row must raise a visible validation message
pub async fn invalid_input_shows_error<D: PageDriver>(
    page: &mut CalculatorPage<D>,
) -> GradecheckResult<()> {
    if page.grade_type() != Some(GradeType::Letter) {
        page.select_grade_type(GradeType::Letter).await?;
    }
    page.add_row_native(&RowInput::weighted("123", "Invalid Grade", "abc"))
        .await?;
    match page.wait_for_error_message().await {
        Ok(visible) if visible > 0 => Ok(()),
        Ok(_) => Err(GradecheckError::assertion("Expected at least one error message.")),
        Err(e) if e.is_timeout() => Err(GradecheckError::assertion(
            "Expected error messages did not appear for invalid inputs.",
        )),
        Err(e) => Err(e),
    }
}
