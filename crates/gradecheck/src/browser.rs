//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`ChromiumDriver`] implements
//! [`PageDriver`](crate::PageDriver) on chromiumoxide. Elements are found by
//! evaluating the locator's query in the page; each match is tagged with a
//! `data-gradecheck-id` attribute and later resolved by that id, so a handle
//! whose node has been removed or replaced reports `StaleElement`.

use crate::config::HarnessConfig;

/// Attribute used to tag located elements
pub const ELEMENT_ID_ATTRIBUTE: &str = "data-gradecheck-id";

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1366,
            viewport_height: 900,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

impl From<&HarnessConfig> for BrowserConfig {
    fn from(config: &HarnessConfig) -> Self {
        let mut browser = Self::default()
            .with_headless(config.headless)
            .with_viewport(config.viewport_width, config.viewport_height);
        if let Some(path) = &config.chromium_path {
            browser = browser.with_chromium_path(path);
        }
        if config.no_sandbox {
            browser = browser.with_no_sandbox();
        }
        browser
    }
}

/// Page scripts behind each driver operation
#[cfg(any(feature = "browser", test))]
mod scripts {
    use super::ELEMENT_ID_ATTRIBUTE;

    /// Script run against the element tagged `id`
    ///
    /// `body` sees the element as `el` and its return value is passed back;
    /// a detached element yields `{stale: true}`.
    pub(super) fn element_script(id: &str, body: &str) -> String {
        let id = serde_json::Value::from(id);
        format!(
            "(() => {{ \
             const el = document.querySelector('[{ELEMENT_ID_ATTRIBUTE}=' + JSON.stringify({id}) + ']'); \
             if (!el || !el.isConnected) return {{ stale: true }}; \
             const value = (() => {{ {body} }})(); \
             return {{ stale: false, value: value === undefined ? null : value }}; \
             }})()"
        )
    }

    /// Script tagging every match of `query` and returning `[id, tagName]` pairs
    pub(super) fn tag_matches_script(query: &str, prefix: &str) -> String {
        format!(
            "{query}.map((el, i) => {{ \
             if (!el.hasAttribute('{ELEMENT_ID_ATTRIBUTE}')) el.setAttribute('{ELEMENT_ID_ATTRIBUTE}', '{prefix}-' + i); \
             return [el.getAttribute('{ELEMENT_ID_ATTRIBUTE}'), el.tagName]; \
             }})"
        )
    }

    pub(super) const ELEMENT_STATE_JS: &str = "const style = window.getComputedStyle(el); \
         const rect = el.getBoundingClientRect(); \
         return { displayed: rect.width > 0 && rect.height > 0 \
           && style.visibility !== 'hidden' && style.display !== 'none', \
           enabled: !el.disabled };";

    /// Hit test at the element's centre; scrolls only when that point lies outside the viewport
    pub(super) const HIT_TEST_JS: &str = "let r = el.getBoundingClientRect(); \
         const inView = b => b.top + b.height / 2 >= 0 && b.left + b.width / 2 >= 0 \
           && b.top + b.height / 2 < window.innerHeight && b.left + b.width / 2 < window.innerWidth; \
         if (!inView(r)) { \
           el.scrollIntoView({block: 'end', inline: 'nearest'}); \
           r = el.getBoundingClientRect(); \
         } \
         const x = r.left + r.width / 2; const y = r.top + r.height / 2; \
         const hit = document.elementFromPoint(x, y); \
         let obscured = null; \
         if (hit && hit !== el && !el.contains(hit)) { \
           const classes = typeof hit.className === 'string' && hit.className.trim() \
             ? '.' + hit.className.trim().split(/\\s+/).join('.') : ''; \
           obscured = hit.tagName.toLowerCase() + (hit.id ? '#' + hit.id : '') + classes; \
         } \
         return { x, y, obscured };";

    pub(super) const CLEAR_JS: &str = "if (el.tagName === 'SELECT') return false; \
         const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
         Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, ''); \
         el.dispatchEvent(new Event('input', { bubbles: true })); \
         el.dispatchEvent(new Event('change', { bubbles: true })); \
         return true;";

    pub(super) fn choose_option_js(text: &str) -> String {
        let text = serde_json::Value::from(text.trim().to_lowercase());
        format!(
            "const text = {text}; \
             const options = Array.from(el.options); \
             const label = o => o.text.trim().toLowerCase(); \
             const pick = options.find(o => label(o) === text) || options.find(o => label(o).startsWith(text)); \
             if (!text || !pick) return false; \
             Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set.call(el, pick.value); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true;"
        )
    }

    pub(super) fn step_js(method: &str) -> String {
        format!(
            "if (typeof el.{method} !== 'function') return false; \
             el.{method}(); \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             return true;"
        )
    }

    pub(super) fn attribute_js(name: &str) -> String {
        let name = serde_json::Value::from(name);
        format!("const name = {name}; return name === 'value' ? el.value : el.getAttribute(name);")
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::scripts::{
        attribute_js, choose_option_js, element_script, step_js, tag_matches_script, CLEAR_JS,
        ELEMENT_STATE_JS, HIT_TEST_JS,
    };
    use super::BrowserConfig;
    use crate::config::HarnessConfig;
    use crate::driver::{
        ElementHandle, ElementState, PageDriver, Screenshot, ScrollAlign, StepDirection,
    };
    use crate::locator::Selector;
    use crate::result::{GradecheckError, GradecheckResult};
    use crate::session::Launcher;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::layout::Point;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use serde::Deserialize;
    use tokio::sync::Mutex;

    #[derive(Debug, Deserialize)]
    struct ElementReply<T> {
        stale: bool,
        value: Option<T>,
    }

    #[derive(Debug, Deserialize)]
    struct HitTest {
        x: f64,
        y: f64,
        obscured: Option<String>,
    }

    fn script_error(e: impl std::fmt::Display) -> GradecheckError {
        GradecheckError::ScriptError {
            message: e.to_string(),
        }
    }

    fn input_error(element: &ElementHandle, message: &str) -> GradecheckError {
        GradecheckError::InputError {
            message: format!("{} <{}>: {message}", element.id, element.tag_name),
        }
    }

    /// Chromium controlled over CDP
    #[derive(Debug)]
    pub struct ChromiumDriver {
        config: BrowserConfig,
        browser: Mutex<CdpBrowser>,
        page: CdpPage,
        handler: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        pub async fn launch(config: BrowserConfig) -> GradecheckResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| GradecheckError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                GradecheckError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| GradecheckError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

            tracing::info!(headless = config.headless, "launched chromium");
            Ok(Self {
                config,
                browser: Mutex::new(browser),
                page,
                handler,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        async fn eval<T: DeserializeOwned>(&self, script: &str) -> GradecheckResult<T> {
            let params = EvaluateParams::builder()
                .expression(script)
                .return_by_value(true)
                .await_promise(true)
                .build()
                .map_err(|message| GradecheckError::ScriptError { message })?;
            let result = self
                .page
                .evaluate_expression(params)
                .await
                .map_err(script_error)?;
            result.into_value().map_err(GradecheckError::from)
        }

        async fn on_element<T: DeserializeOwned>(
            &self,
            element: &ElementHandle,
            body: &str,
        ) -> GradecheckResult<Option<T>> {
            let reply: ElementReply<T> = self.eval(&element_script(&element.id, body)).await?;
            if reply.stale {
                return Err(GradecheckError::StaleElement {
                    element: element.id.clone(),
                });
            }
            Ok(reply.value)
        }

        async fn tag_matches(&self, query: &str) -> GradecheckResult<Vec<ElementHandle>> {
            let prefix = uuid::Uuid::new_v4().simple().to_string();
            let pairs: Vec<(String, String)> =
                self.eval(&tag_matches_script(query, &prefix)).await?;
            Ok(pairs
                .into_iter()
                .map(|(id, tag)| ElementHandle::new(id, tag))
                .collect())
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn navigate(&mut self, url: &str) -> GradecheckResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| GradecheckError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            tracing::debug!(url, "navigated");
            Ok(())
        }

        async fn current_url(&self) -> GradecheckResult<String> {
            let url = self.page.url().await.map_err(script_error)?;
            Ok(url.unwrap_or_default())
        }

        async fn find_elements(&self, selector: &Selector) -> GradecheckResult<Vec<ElementHandle>> {
            self.tag_matches(&selector.to_all_query()).await
        }

        async fn find_elements_within(
            &self,
            parent: &ElementHandle,
            selector: &Selector,
        ) -> GradecheckResult<Vec<ElementHandle>> {
            let prefix = uuid::Uuid::new_v4().simple().to_string();
            let body = format!(
                "return {};",
                tag_matches_script(&selector.to_all_query_from("el"), &prefix)
            );
            let pairs: Vec<(String, String)> =
                self.on_element(parent, &body).await?.unwrap_or_default();
            Ok(pairs
                .into_iter()
                .map(|(id, tag)| ElementHandle::new(id, tag))
                .collect())
        }

        async fn element_state(&self, element: &ElementHandle) -> GradecheckResult<ElementState> {
            Ok(self
                .on_element(element, ELEMENT_STATE_JS)
                .await?
                .unwrap_or_default())
        }

        async fn click(&self, element: &ElementHandle) -> GradecheckResult<()> {
            let hit: HitTest = self
                .on_element(element, HIT_TEST_JS)
                .await?
                .ok_or_else(|| script_error("hit test returned nothing"))?;
            if let Some(obscured_by) = hit.obscured {
                return Err(GradecheckError::ClickIntercepted {
                    element: element.id.clone(),
                    obscured_by,
                });
            }
            self.page
                .click(Point::new(hit.x, hit.y))
                .await
                .map_err(|e| input_error(element, &e.to_string()))?;
            Ok(())
        }

        async fn js_click(&self, element: &ElementHandle) -> GradecheckResult<()> {
            self.on_element::<serde_json::Value>(element, "el.click(); return true;")
                .await?;
            Ok(())
        }

        async fn scroll_into_view(
            &self,
            element: &ElementHandle,
            align: ScrollAlign,
        ) -> GradecheckResult<()> {
            let body = format!("el.scrollIntoView({}); return true;", align.js_argument());
            self.on_element::<serde_json::Value>(element, &body).await?;
            Ok(())
        }

        async fn clear(&self, element: &ElementHandle) -> GradecheckResult<()> {
            match self.on_element::<bool>(element, CLEAR_JS).await? {
                Some(true) => Ok(()),
                _ => Err(input_error(element, "element cannot be cleared")),
            }
        }

        async fn send_keys(&self, element: &ElementHandle, text: &str) -> GradecheckResult<()> {
            if element.is_select() {
                // No matching option leaves the selection unchanged, as typing would
                let chosen = self
                    .on_element::<bool>(element, &choose_option_js(text))
                    .await?;
                tracing::debug!(element = %element.id, text, chosen = ?chosen, "typed into select");
                return Ok(());
            }
            self.on_element::<serde_json::Value>(element, "el.focus(); return true;")
                .await?;
            self.page
                .execute(InsertTextParams::new(text))
                .await
                .map_err(|e| input_error(element, &e.to_string()))?;
            Ok(())
        }

        async fn value(&self, element: &ElementHandle) -> GradecheckResult<String> {
            Ok(self
                .on_element(element, "return el.value === undefined ? '' : String(el.value);")
                .await?
                .unwrap_or_default())
        }

        async fn attribute(
            &self,
            element: &ElementHandle,
            name: &str,
        ) -> GradecheckResult<Option<String>> {
            self.on_element(element, &attribute_js(name)).await
        }

        async fn step(&self, element: &ElementHandle, direction: StepDirection) -> GradecheckResult<()> {
            match self
                .on_element::<bool>(element, &step_js(direction.method()))
                .await?
            {
                Some(true) => Ok(()),
                _ => Err(input_error(
                    element,
                    &format!("{}() is not supported", direction.method()),
                )),
            }
        }

        async fn screenshot(&self) -> GradecheckResult<Screenshot> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                self.page
                    .execute(params)
                    .await
                    .map_err(|e| GradecheckError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            use base64::Engine;
            let data = base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| GradecheckError::ScreenshotError {
                    message: e.to_string(),
                })?;
            Ok(Screenshot::new(data))
        }

        async fn quit(&mut self) -> GradecheckResult<()> {
            let mut browser = self.browser.lock().await;
            let closed = browser.close().await.map(|_| ());
            if closed.is_ok() {
                let _ = browser.wait().await;
            }
            self.handler.abort();
            closed.map_err(|e| GradecheckError::BrowserLaunchError {
                message: e.to_string(),
            })?;
            tracing::info!("closed chromium");
            Ok(())
        }
    }

    /// [`Launcher`] starting a fresh Chromium per session
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ChromiumLauncher;

    #[async_trait]
    impl Launcher for ChromiumLauncher {
        type Driver = ChromiumDriver;

        async fn launch(&self, config: &HarnessConfig) -> GradecheckResult<ChromiumDriver> {
            ChromiumDriver::launch(BrowserConfig::from(config)).await
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumLauncher};

#[cfg(test)]
mod tests {
    use super::scripts::*;
    use super::*;

    #[test]
    fn test_from_harness_config() {
        let harness = HarnessConfig {
            headless: false,
            no_sandbox: true,
            chromium_path: Some("/usr/bin/chromium".into()),
            viewport_width: 1024,
            viewport_height: 768,
            ..HarnessConfig::default()
        };
        let config = BrowserConfig::from(&harness);
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!((config.viewport_width, config.viewport_height), (1024, 768));
    }

    #[test]
    fn test_element_script_quotes_id() {
        let script = element_script("abc-0", "return el.value;");
        assert!(script.contains("JSON.stringify(\"abc-0\")"));
        assert!(script.contains("return { stale: true }"));
        assert!(script.contains("return el.value;"));
    }

    #[test]
    fn test_tag_matches_script() {
        let script = tag_matches_script("Array.from(document.querySelectorAll(\"form\"))", "p1");
        assert!(script.starts_with("Array.from(document.querySelectorAll(\"form\")).map("));
        assert!(script.contains("'p1-' + i"));
    }

    #[test]
    fn test_option_text_is_escaped() {
        let script = choose_option_js(" B+\" ");
        assert!(script.contains(r#"const text = "b+\"";"#));
    }

    #[test]
    fn test_step_js() {
        assert!(step_js("stepDown").contains("el.stepDown();"));
    }

    #[test]
    fn test_hit_test_keeps_caller_scroll_when_in_view() {
        assert!(HIT_TEST_JS.starts_with("let r = el.getBoundingClientRect();"));
        let guard = HIT_TEST_JS.find("if (!inView(r))").unwrap();
        let scroll = HIT_TEST_JS.find("scrollIntoView").unwrap();
        assert!(guard < scroll);
        assert_eq!(HIT_TEST_JS.matches("scrollIntoView").count(), 1);
        assert!(HIT_TEST_JS.contains("window.innerHeight"));
        assert!(!HIT_TEST_JS.contains("block: 'center'"));
    }
}
