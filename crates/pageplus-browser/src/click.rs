//! Clicking elements located by their text

use std::time::Duration;

use pageplus_core::WaitsConfig;
use tracing::{debug, info};

use crate::driver::PageDriver;
use crate::error::Result;
use crate::script::{self, TextMatch};

/// An element under an XPath path whose text matches
#[derive(Debug, Clone, PartialEq)]
pub struct TextClick {
    /// Path without a predicate, e.g. `//ul[@id="allBsnsList"]/li/a`
    pub path: String,
    pub text: String,
    pub matching: TextMatch,
    /// How long the element may take to appear
    pub timeout: Duration,
}

impl TextClick {
    /// Substring match with the default native-click timeout
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_config(path, text, &WaitsConfig::default())
    }

    /// Substring match waiting `waits.click_timeout_ms`
    pub fn from_config(path: impl Into<String>, text: impl Into<String>, config: &WaitsConfig) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            matching: TextMatch::Contains,
            timeout: Duration::from_millis(config.click_timeout_ms),
        }
    }

    /// Substring match with the default wait for dispatched clicks
    pub fn bubbling(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self::bubbling_from_config(path, text, &WaitsConfig::default())
    }

    /// Substring match waiting `waits.bubbling_click_timeout_ms`
    pub fn bubbling_from_config(
        path: impl Into<String>,
        text: impl Into<String>,
        config: &WaitsConfig,
    ) -> Self {
        Self::from_config(path, text, config)
            .with_timeout(Duration::from_millis(config.bubbling_click_timeout_ms))
    }

    pub fn exact(mut self) -> Self {
        self.matching = TextMatch::Exact;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full XPath expression that will be looked up
    pub fn expression(&self) -> String {
        script::text_xpath(&self.path, &self.text, self.matching)
    }
}

/// Wait for the text match and click it natively
///
/// Fails with [`PageError::Timeout`](crate::PageError::Timeout) naming the
/// constructed expression when nothing matches in time.
pub async fn click_element_with_text<D>(driver: &D, target: &TextClick) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    let xpath = target.expression();
    debug!("Clicking {}", xpath);

    driver.wait_for_xpath(&xpath, target.timeout).await?;
    driver.click_xpath(&xpath).await?;

    info!("Clicked element with text \"{}\"", target.text);
    Ok(())
}

/// Like [`click_element_with_text`] but dispatches a bubbling `click` event
///
/// Useful when the listener sits on an ancestor and a native click on the
/// element itself is rejected (not visible, not an HTMLElement).
pub async fn click_element_with_text_bubbling<D>(driver: &D, target: &TextClick) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    let xpath = target.expression();
    debug!("Dispatching click event to {}", xpath);

    driver.wait_for_xpath(&xpath, target.timeout).await?;
    driver.dispatch_click_xpath(&xpath).await?;

    info!("Dispatched click to element with text \"{}\"", target.text);
    Ok(())
}
