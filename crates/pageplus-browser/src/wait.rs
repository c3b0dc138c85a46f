//! Waiting for page state: visible text and network responses

use std::time::Duration;

use pageplus_core::WaitsConfig;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::driver::PageDriver;
use crate::error::{PageError, Result};

/// Bounds for page and network waits
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOptions {
    /// Limit for [`wait_for_text_on_page`]
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Limit for [`wait_for_url_containing`]
    pub response_timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from_config(&WaitsConfig::default())
    }
}

impl WaitOptions {
    pub fn from_config(config: &WaitsConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.text_timeout_ms),
            poll_interval: Duration::from_millis(config.text_poll_ms),
            response_timeout: Duration::from_millis(config.response_timeout_ms),
        }
    }
}

/// Wait until the visible text of the page body contains `text`
///
/// On timeout the error names the current URL and the missing text.
pub async fn wait_for_text_on_page<D>(driver: &D, text: &str, options: &WaitOptions) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    if options.poll_interval.is_zero() {
        return Err(PageError::InvalidInput(
            "poll interval must be greater than zero".to_string(),
        ));
    }

    debug!("Waiting for text \"{}\" (timeout: {:?})", text, options.timeout);
    let deadline = Instant::now() + options.timeout;

    loop {
        if driver.page_text().await?.contains(text) {
            info!("Found text \"{}\" on page", text);
            return Ok(());
        }

        if Instant::now() >= deadline {
            let url = driver.current_url().await?;
            return Err(PageError::Timeout {
                what: format!("page {} does not contain \"{}\"", url, text),
                after: options.timeout,
            });
        }

        tokio::time::sleep(options.poll_interval).await;
    }
}

/// Wait for a network response whose URL contains `fragment`
///
/// Returns the full URL of the first matching response. Gives up after
/// `options.response_timeout`.
pub async fn wait_for_url_containing<D>(driver: &D, fragment: &str, options: &WaitOptions) -> Result<String>
where
    D: PageDriver + ?Sized,
{
    debug!("Waiting for response URL containing {}", fragment);
    let url = driver
        .wait_for_response(fragment, options.response_timeout)
        .await?;
    info!("Observed response {}", url);
    Ok(url)
}
