//! Locator abstraction for element selection.
//!
//! A [`Locator`] pairs a CSS or XPath [`Selector`] with a description used in
//! logs and timeout errors. Selectors render to JavaScript expressions so a
//! CDP-backed driver can resolve them inside the page.

use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "form.flex.flex-col.gap-2")
    Css(String),
    /// XPath selector
    XPath(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// The raw selector text
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// JavaScript expression evaluating to an array of all matches in the document
    #[must_use]
    pub fn to_all_query(&self) -> String {
        self.to_all_query_from("document")
    }

    /// JavaScript expression evaluating to an array of all matches under `root`
    ///
    /// `root` is itself a JavaScript expression yielding a node.
    #[must_use]
    pub fn to_all_query_from(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from(({root}).querySelectorAll({s:?}))"),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({s:?}, {root}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()"
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// A selector with a human-readable name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    selector: Selector,
    description: String,
}

impl Locator {
    /// Create a locator from a CSS selector, described by the selector itself
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from an XPath expression
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::from_selector(Selector::XPath(expression.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        let description = selector.to_string();
        Self {
            selector,
            description,
        }
    }

    /// A `<button>` whose own text contains `text`
    #[must_use]
    pub fn button_with_text(text: &str) -> Self {
        Self::xpath(format!("//button[contains(text(), '{text}')]"))
            .described_as(format!("'{text}' button"))
    }

    /// A `<button>` whose whitespace-normalised text equals `label`
    #[must_use]
    pub fn button_labelled(label: &str) -> Self {
        Self::xpath(format!("//button[normalize-space()='{label}']"))
            .described_as(format!("'{label}' button"))
    }

    /// Replace the description
    #[must_use]
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_all_query() {
            let query = Selector::css("div.flex.flex-row").to_all_query();
            assert_eq!(
                query,
                "Array.from((document).querySelectorAll(\"div.flex.flex-row\"))"
            );
        }

        #[test]
        fn test_css_scoped_query() {
            let query = Selector::css("div.flex.flex-row").to_all_query_from("form");
            assert!(query.starts_with("Array.from((form)"));
        }

        #[test]
        fn test_xpath_all_query() {
            let query = Selector::xpath("//button[1]").to_all_query();
            assert!(query.contains("document.evaluate(\"//button[1]\", document"));
            assert!(query.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(query.contains("snapshotItem"));
        }

        #[test]
        fn test_quotes_are_escaped() {
            let query = Selector::css("input[placeholder='e.g Assignment']").to_all_query();
            assert_eq!(
                query,
                "Array.from((document).querySelectorAll(\"input[placeholder='e.g Assignment']\"))"
            );
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("form").to_string(), "css=form");
            assert_eq!(Selector::xpath("//a").to_string(), "xpath=//a");
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_button_labelled() {
            let locator = Locator::button_labelled("Reset/Clear");
            assert_eq!(
                locator.selector(),
                &Selector::XPath("//button[normalize-space()='Reset/Clear']".into())
            );
            assert_eq!(locator.description(), "'Reset/Clear' button");
        }

        #[test]
        fn test_button_with_text() {
            let locator = Locator::button_with_text("Points");
            assert_eq!(
                locator.selector().as_str(),
                "//button[contains(text(), 'Points')]"
            );
        }

        #[test]
        fn test_default_description_is_selector() {
            let locator = Locator::css(".error-message");
            assert_eq!(locator.to_string(), "css=.error-message");
        }
    }
}
