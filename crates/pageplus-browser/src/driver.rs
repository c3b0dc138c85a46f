//! The page capability every helper delegates to
//!
//! [`PageDriver`] is the seam between the helpers in this crate and a real
//! browser. [`BrowserSession`](crate::browser::BrowserSession) implements it
//! over Chrome DevTools; tests implement it in memory.
//!
//! Only the operations that need a native driver capability are required.
//! The rest have default implementations built on [`PageDriver::evaluate`],
//! which an implementation may override.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{PageError, Result};
use crate::persist::CookieRecord;
use crate::script;

/// A typed reference to one element in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementLocator {
    /// CSS selector, first match wins
    Css(String),
    /// XPath expression, first match in document order wins
    XPath(String),
}

impl ElementLocator {
    pub fn css(selector: impl Into<String>) -> Self {
        ElementLocator::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        ElementLocator::XPath(expression.into())
    }

    /// The raw selector or expression
    pub fn as_str(&self) -> &str {
        match self {
            ElementLocator::Css(s) | ElementLocator::XPath(s) => s,
        }
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementLocator::Css(s) => write!(f, "css {}", s),
            ElementLocator::XPath(s) => write!(f, "xpath {}", s),
        }
    }
}

/// Which browser key-value store to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// `window.localStorage`, persists across sessions
    Local,
    /// `window.sessionStorage`, scoped to the tab session
    Session,
}

/// Encoded image format for captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

/// Parameters for a single image capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub format: ImageFormat,
    /// Compression quality (1-100), ignored for PNG
    pub quality: Option<u8>,
    /// Capture the whole scrollable area instead of the viewport
    pub full_page: bool,
}

/// Browser page capability
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Evaluate a JavaScript expression and return its primitive result
    ///
    /// `undefined` and `null` both come back as [`Value::Null`].
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Native click on the first element matching a CSS selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait until a CSS selector matches, failing with [`PageError::Timeout`]
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Wait until an XPath expression matches, failing with [`PageError::Timeout`]
    async fn wait_for_xpath(&self, xpath: &str, timeout: Duration) -> Result<()>;

    /// Native click on the first element matching an XPath expression
    async fn click_xpath(&self, xpath: &str) -> Result<()>;

    /// Send keystrokes to the focused element
    async fn type_text(&self, text: &str) -> Result<()>;

    /// Every cookie visible to the page
    async fn cookies(&self) -> Result<Vec<CookieRecord>>;

    /// Insert or overwrite cookies
    async fn set_cookies(&self, cookies: Vec<CookieRecord>) -> Result<()>;

    /// Capture the rendered page into an in-memory image
    async fn capture_screenshot(&self, request: &CaptureRequest) -> Result<Vec<u8>>;

    /// Wait for a network response whose URL contains `url_fragment`
    ///
    /// Returns the full URL of the matching response.
    async fn wait_for_response(&self, url_fragment: &str, timeout: Duration) -> Result<String>;

    /// `textContent` of the first element matching a selector, `None` if absent
    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        match self.evaluate(&script::text_content(selector)).await? {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            other => Err(PageError::Script(format!(
                "textContent of {} was {}",
                selector, other
            ))),
        }
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let found = self.evaluate(&script::scroll_into_view(selector)).await?;
        if found.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(PageError::NotFound(selector.to_string()))
        }
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<()> {
        self.evaluate(&script::scroll_by(dx, dy)).await?;
        Ok(())
    }

    /// Current vertical scroll offset of the document
    async fn scroll_offset(&self) -> Result<f64> {
        let value = self.evaluate(script::SCROLL_OFFSET).await?;
        value
            .as_f64()
            .ok_or_else(|| PageError::Script(format!("scrollTop was {}", value)))
    }

    async fn viewport_height(&self) -> Result<f64> {
        let value = self.evaluate(script::VIEWPORT_HEIGHT).await?;
        value
            .as_f64()
            .ok_or_else(|| PageError::Script(format!("innerHeight was {}", value)))
    }

    /// Visible text of the page body
    async fn page_text(&self) -> Result<String> {
        match self.evaluate(script::PAGE_TEXT).await? {
            Value::String(text) => Ok(text),
            other => Err(PageError::Script(format!("body innerText was {}", other))),
        }
    }

    async fn current_url(&self) -> Result<String> {
        match self.evaluate(script::CURRENT_URL).await? {
            Value::String(url) => Ok(url),
            other => Err(PageError::Script(format!("location.href was {}", other))),
        }
    }

    /// Dispatch a synthetic bubbling `click` event at an XPath match
    async fn dispatch_click_xpath(&self, xpath: &str) -> Result<()> {
        let locator = ElementLocator::xpath(xpath);
        let dispatched = self.evaluate(&script::dispatch_click(&locator)).await?;
        if dispatched.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(PageError::NotFound(xpath.to_string()))
        }
    }

    /// Select options of a `<select>` by value, returning the selected values
    async fn select_value(&self, selector: &str, values: &[&str]) -> Result<Vec<String>> {
        let result = self.evaluate(&script::select_value(selector, values)).await?;
        let selected: Option<Vec<String>> = script::decode_json(result, "select")?;
        selected.ok_or_else(|| PageError::NotFound(selector.to_string()))
    }

    /// `outerHTML` of an element
    async fn outer_html(&self, locator: &ElementLocator) -> Result<String> {
        match self.evaluate(&script::outer_html(locator)).await? {
            Value::String(html) => Ok(html),
            _ => Err(PageError::NotFound(locator.to_string())),
        }
    }

    /// Snapshot of one browser store
    async fn storage_entries(&self, kind: StorageKind) -> Result<BTreeMap<String, String>> {
        let result = self.evaluate(&script::storage_entries(kind)).await?;
        script::decode_json(result, kind.js_name())
    }

    async fn set_storage_item(&self, kind: StorageKind, key: &str, value: &str) -> Result<()> {
        debug!("Setting {} item {}", kind.js_name(), key);
        self.evaluate(&script::set_storage_item(kind, key, value))
            .await?;
        Ok(())
    }
}

/// Outer markup of an element, failing with [`PageError::NotFound`] when absent
pub async fn element_markup<D>(driver: &D, locator: &ElementLocator) -> Result<String>
where
    D: PageDriver + ?Sized,
{
    driver.outer_html(locator).await
}
