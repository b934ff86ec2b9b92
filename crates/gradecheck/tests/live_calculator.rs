//! Scenarios against the deployed calculator in Chromium.
//!
//! Run with:
//!
//! ```text
//! cargo test -p gradecheck --features browser --test live_calculator -- --ignored
//! ```
//!
//! `GRADECHECK_URL`, `GRADECHECK_HEADLESS`, `CHROMIUM_PATH` and
//! `GRADECHECK_NO_SANDBOX` override the defaults.

#![cfg(feature = "browser")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use futures::FutureExt;
use gradecheck::prelude::*;

fn config() -> HarnessConfig {
    let _ = gradecheck::logging::init();
    HarnessConfig::from_env().expect("environment overrides should parse")
}

fn assert_passed(outcome: &ScenarioOutcome) {
    assert!(outcome.passed, "{} failed: {:?}", outcome.name, outcome.error);
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_initial_layout() {
    let outcome = run_scenario(&ChromiumLauncher, &config(), "initial layout", |p| {
        scenarios::initial_layout(p).boxed()
    })
    .await;
    assert_passed(&outcome);
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_all_grade_types() {
    let outcome = run_scenario(&ChromiumLauncher, &config(), "all grade types", |p| {
        scenarios::all_grade_types(p).boxed()
    })
    .await;
    assert_passed(&outcome);
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_add_and_reset_cycles() {
    let rows = scenarios::cycle_rows();
    let outcome = run_scenario(&ChromiumLauncher, &config(), "add and reset", move |p| {
        async move { scenarios::add_and_reset_cycles(p, 3, &rows).await }.boxed()
    })
    .await;
    assert_passed(&outcome);
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_delete_single_row() {
    let rows = scenarios::delete_rows();
    let outcome = run_scenario(&ChromiumLauncher, &config(), "delete row", move |p| {
        async move { scenarios::delete_single_row(p, &rows).await }.boxed()
    })
    .await;
    assert_passed(&outcome);
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_numeric_fields() {
    for field in [NumericField::Grade, NumericField::Weight] {
        let outcome = run_scenario(&ChromiumLauncher, &config(), "spin buttons", move |p| {
            async move {
                scenarios::numeric_field_stays_in_range(p, field, 150, 200).await?;
                scenarios::spin_button_steps(p, field).await
            }
            .boxed()
        })
        .await;
        assert_passed(&outcome);
    }
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_input_validation() {
    let outcome = run_scenario(&ChromiumLauncher, &config(), "input validation", |p| {
        async move {
            scenarios::task_input_accepts_any_text(p).await?;
            scenarios::grade_input_validation(p).await?;
            scenarios::invalid_input_shows_error(p).await
        }
        .boxed()
    })
    .await;
    assert_passed(&outcome);
}

#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn live_letter_rows() {
    let config = config().with_grade_type(GradeType::Letter);
    for row in scenarios::letter_param_rows() {
        let outcome = run_scenario(&ChromiumLauncher, &config, "letter row", move |p| {
            async move { scenarios::letter_row_entry(p, &row).await }.boxed()
        })
        .await;
        assert_passed(&outcome);
    }
}
