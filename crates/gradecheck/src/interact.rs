//! Element interactions with the retry policy the calculator needs.
//!
//! Clicks can land on an overlay or hit an element React has just replaced.
//! [`click_with_retry`] re-locates and retries such a click exactly once;
//! [`script_click`] sidesteps hit-testing altogether for buttons that are
//! known to sit under sticky headers.

use crate::driver::{ElementHandle, PageDriver, ScrollAlign, StepDirection};
use crate::locator::Locator;
use crate::result::{GradecheckError, GradecheckResult};
use crate::wait::{ElementCondition, Waiter};

/// Wait for `locator` to be clickable and click it natively
///
/// An intercepted click is retried once after scrolling the re-located
/// element to the top of the viewport; a stale handle is re-located and
/// clicked once more. A failure of the retry is returned as is.
pub async fn click_with_retry<D>(
    driver: &D,
    waiter: &Waiter,
    locator: &Locator,
) -> GradecheckResult<()>
where
    D: PageDriver + ?Sized,
{
    let element = waiter
        .for_element(driver, locator, ElementCondition::Clickable)
        .await?;

    match driver.click(&element).await {
        Ok(()) => Ok(()),
        Err(GradecheckError::ClickIntercepted { obscured_by, .. }) => {
            tracing::warn!(target_locator = %locator, %obscured_by, "click intercepted, retrying once");
            let element = waiter
                .for_element(driver, locator, ElementCondition::Clickable)
                .await?;
            driver.scroll_into_view(&element, ScrollAlign::Start).await?;
            driver.click(&element).await
        }
        Err(GradecheckError::StaleElement { .. }) => {
            tracing::warn!(target_locator = %locator, "stale element, re-locating once");
            let element = waiter
                .for_element(driver, locator, ElementCondition::Clickable)
                .await?;
            driver.click(&element).await
        }
        Err(e) => Err(e),
    }
}

/// Wait for `locator` to be clickable, centre it and click it through JavaScript
pub async fn script_click<D>(
    driver: &D,
    waiter: &Waiter,
    locator: &Locator,
) -> GradecheckResult<ElementHandle>
where
    D: PageDriver + ?Sized,
{
    let element = waiter
        .for_element(driver, locator, ElementCondition::Clickable)
        .await?;
    driver.scroll_into_view(&element, ScrollAlign::Center).await?;
    driver.js_click(&element).await?;
    Ok(element)
}

/// Replace an input's value
pub async fn fill<D>(driver: &D, element: &ElementHandle, text: &str) -> GradecheckResult<()>
where
    D: PageDriver + ?Sized,
{
    driver.clear(element).await?;
    driver.send_keys(element, text).await
}

/// Pick an option of a `<select>` by typing its text
pub async fn choose<D>(driver: &D, element: &ElementHandle, text: &str) -> GradecheckResult<()>
where
    D: PageDriver + ?Sized,
{
    if !element.is_select() {
        return Err(GradecheckError::InputError {
            message: format!("{} is a <{}>, not a <select>", element.id, element.tag_name),
        });
    }
    driver.send_keys(element, text).await
}

/// Press a number input's spin button `clicks` times
pub async fn step<D>(
    driver: &D,
    element: &ElementHandle,
    direction: StepDirection,
    clicks: u32,
) -> GradecheckResult<()>
where
    D: PageDriver + ?Sized,
{
    for _ in 0..clicks {
        driver.step(element, direction).await?;
    }
    Ok(())
}
