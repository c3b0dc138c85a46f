//! Chrome DevTools implementation of [`PageDriver`]

use std::ffi::OsStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Network::{Cookie, CookieParam};
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use headless_chrome::{Browser, LaunchOptions, Tab};
use pageplus_core::BrowserLaunchConfig;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::driver::{CaptureRequest, ImageFormat, PageDriver};
use crate::error::{PageError, Result};
use crate::persist::CookieRecord;
use crate::script;

/// Configuration for browser launch
pub type BrowserConfig = BrowserLaunchConfig;

static RESPONSE_WAITERS: AtomicU64 = AtomicU64::new(0);

/// Active browser session with Chrome DevTools Protocol
pub struct BrowserSession {
    /// Underlying browser instance (kept alive for tab lifetime)
    #[allow(dead_code)]
    browser: Browser,
    /// Current active tab
    tab: Arc<Tab>,
    /// Configuration
    config: BrowserConfig,
}

impl BrowserSession {
    /// Launch a new browser instance
    pub async fn launch() -> Result<Self> {
        Self::launch_with_config(BrowserConfig::default()).await
    }

    /// Launch browser with custom configuration
    pub async fn launch_with_config(config: BrowserConfig) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.window_width, config.window_height
        );

        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .build()
            .map_err(|e| PageError::Browser(format!("Failed to launch browser: {}", e)))?;

        let user_agent_arg: Option<String> = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));
        if let Some(ref ua_arg) = user_agent_arg {
            launch_options.args.push(OsStr::new(ua_arg));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| PageError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| PageError::Browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(tab_timeout(&config));

        info!("Browser launched successfully");

        Ok(Self {
            browser,
            tab,
            config,
        })
    }

    /// Connect to an existing browser instance
    ///
    /// # Arguments
    /// * `port` - Chrome DevTools Protocol port (typically 9222)
    pub async fn connect(port: u16) -> Result<Self> {
        info!("Connecting to existing browser on port {}", port);

        let browser = Browser::connect(format!("http://127.0.0.1:{}", port))
            .map_err(|e| PageError::Browser(format!("Failed to connect to browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| PageError::Browser(format!("Failed to create tab: {}", e)))?;
        let config = BrowserConfig::default();
        tab.set_default_timeout(tab_timeout(&config));

        info!("Connected to browser successfully");

        Ok(Self {
            browser,
            tab,
            config,
        })
    }

    /// Navigate to a URL and wait for the load to finish
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);

        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        blocking(move || {
            tab.navigate_to(&target)
                .map_err(|e| PageError::Browser(format!("Failed to navigate to {}: {}", target, e)))?;
            tab.wait_until_navigated()
                .map_err(|e| PageError::Browser(format!("Navigation timeout for {}: {}", target, e)))?;
            Ok(())
        })
        .await?;

        info!("Successfully navigated to {}", url);
        Ok(())
    }

    /// Timeout the tab applies to its own element lookups and navigation
    pub fn default_timeout(&self) -> Duration {
        tab_timeout(&self.config)
    }

    /// Get reference to the active tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Close the browser session
    pub async fn close(self) -> Result<()> {
        info!("Closing browser session");
        Ok(())
    }

    async fn document_clip(&self) -> Result<Viewport> {
        #[derive(Deserialize)]
        struct DocumentSize {
            width: f64,
            height: f64,
        }

        let size: DocumentSize =
            script::decode_json(self.evaluate(script::DOCUMENT_SIZE).await?, "document size")?;
        Ok(Viewport {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
            scale: 1.0,
        })
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        debug!("BrowserSession dropped, browser will be cleaned up");
    }
}

/// Run a blocking DevTools call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PageError::Browser(format!("Browser task failed: {}", e)))?
}

fn tab_timeout(config: &BrowserConfig) -> Duration {
    Duration::from_secs(config.timeout_seconds)
}

fn cookie_to_record(cookie: &Cookie) -> Result<CookieRecord> {
    Ok(serde_json::from_value(serde_json::to_value(cookie)?)?)
}

fn record_to_param(record: &CookieRecord) -> Result<CookieParam> {
    serde_json::from_value(record.to_set_params())
        .map_err(|e| PageError::InvalidInput(format!("cookie {}: {}", record.name, e)))
}

/// Convert every record, failing on the first one the browser cannot accept
fn cookie_params(records: &[CookieRecord]) -> Result<Vec<CookieParam>> {
    records.iter().map(record_to_param).collect()
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn evaluate(&self, script: &str) -> Result<Value> {
        debug!("Evaluating JavaScript: {}", script);

        let tab = Arc::clone(&self.tab);
        let script = script.to_string();
        let result = blocking(move || {
            tab.evaluate(&script, true)
                .map_err(|e| PageError::Browser(format!("JavaScript evaluation failed: {}", e)))
        })
        .await?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();
        blocking(move || {
            let element = tab
                .find_element(&selector)
                .map_err(|_e| PageError::NotFound(selector.clone()))?;
            element
                .click()
                .map_err(|e| PageError::Browser(format!("Failed to click {}: {}", selector, e)))?;
            Ok(())
        })
        .await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        debug!("Waiting for element: {} (timeout: {:?})", selector, timeout);

        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();
        blocking(move || {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map(|_| ())
                .map_err(|_e| PageError::Timeout {
                    what: format!("selector {}", selector),
                    after: timeout,
                })
        })
        .await
    }

    async fn wait_for_xpath(&self, xpath: &str, timeout: Duration) -> Result<()> {
        debug!("Waiting for xpath: {} (timeout: {:?})", xpath, timeout);

        let tab = Arc::clone(&self.tab);
        let xpath = xpath.to_string();
        blocking(move || {
            tab.wait_for_xpath_with_custom_timeout(&xpath, timeout)
                .map(|_| ())
                .map_err(|_e| PageError::Timeout {
                    what: format!("xpath {}", xpath),
                    after: timeout,
                })
        })
        .await
    }

    async fn click_xpath(&self, xpath: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let xpath = xpath.to_string();
        blocking(move || {
            let element = tab
                .find_element_by_xpath(&xpath)
                .map_err(|_e| PageError::NotFound(xpath.clone()))?;
            element
                .click()
                .map_err(|e| PageError::Browser(format!("Failed to click {}: {}", xpath, e)))?;
            Ok(())
        })
        .await
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let text = text.to_string();
        blocking(move || {
            tab.type_str(&text)
                .map(|_| ())
                .map_err(|e| PageError::Browser(format!("Failed to type text: {}", e)))
        })
        .await
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>> {
        let tab = Arc::clone(&self.tab);
        let cookies = blocking(move || {
            tab.get_cookies()
                .map_err(|e| PageError::Browser(format!("Failed to read cookies: {}", e)))
        })
        .await?;

        cookies.iter().map(cookie_to_record).collect()
    }

    async fn set_cookies(&self, cookies: Vec<CookieRecord>) -> Result<()> {
        let params = cookie_params(&cookies)?;

        let tab = Arc::clone(&self.tab);
        blocking(move || {
            tab.set_cookies(params)
                .map_err(|e| PageError::Browser(format!("Failed to set cookies: {}", e)))
        })
        .await
    }

    async fn capture_screenshot(&self, request: &CaptureRequest) -> Result<Vec<u8>> {
        let format = match request.format {
            ImageFormat::Jpeg => CaptureScreenshotFormatOption::Jpeg,
            ImageFormat::Png => CaptureScreenshotFormatOption::Png,
        };
        let quality = match request.format {
            ImageFormat::Jpeg => request.quality.map(u32::from),
            ImageFormat::Png => None,
        };
        let clip = if request.full_page {
            Some(self.document_clip().await?)
        } else {
            None
        };

        let tab = Arc::clone(&self.tab);
        blocking(move || {
            tab.capture_screenshot(format, quality, clip, true)
                .map_err(|e| PageError::Browser(format!("CDP capture failed: {}", e)))
        })
        .await
    }

    async fn wait_for_response(&self, url_fragment: &str, timeout: Duration) -> Result<String> {
        let handler_name = format!(
            "pageplus-response-{}",
            RESPONSE_WAITERS.fetch_add(1, Ordering::Relaxed)
        );
        let (tx, rx) = oneshot::channel::<String>();
        let tx = Mutex::new(Some(tx));
        let fragment = url_fragment.to_string();

        let tab = Arc::clone(&self.tab);
        let name = handler_name.clone();
        blocking(move || {
            tab.register_response_handling(
                name,
                Box::new(move |params, _body| {
                    if !params.response.url.contains(&fragment) {
                        return;
                    }
                    if let Ok(mut slot) = tx.lock() {
                        if let Some(tx) = slot.take() {
                            let _ = tx.send(params.response.url.clone());
                        }
                    }
                }),
            )
            .map(|_| ())
            .map_err(|e| PageError::Browser(format!("Failed to watch responses: {}", e)))
        })
        .await?;

        let outcome = tokio::time::timeout(timeout, rx).await;

        let tab = Arc::clone(&self.tab);
        let name = handler_name.clone();
        let removed = blocking(move || {
            tab.deregister_response_handling(&name)
                .map(|_| ())
                .map_err(|e| PageError::Browser(e.to_string()))
        })
        .await;
        if let Err(e) = removed {
            warn!("Failed to remove response handler {}: {}", handler_name, e);
        }

        match outcome {
            Ok(Ok(url)) => Ok(url),
            Ok(Err(_)) => Err(PageError::Browser(
                "response handler dropped before a match".to_string(),
            )),
            Err(_) => Err(PageError::Timeout {
                what: format!("response with URL containing {}", url_fragment),
                after: timeout,
            }),
        }
    }
}
