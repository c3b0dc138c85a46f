//! Convenience helpers layered on a browser page
//!
//! This crate adds the small operations that browser automation scripts keep
//! rewriting: scrolling until a lazily loaded page stops growing, filling
//! form controls, clicking elements by their text, waiting for text or
//! network responses, saving screenshots, and persisting cookies and web
//! storage between runs.
//!
//! # Example
//!
//! ```no_run
//! use pageplus_browser::{
//!     autoscroll, cookie_load, cookie_save, save_screenshot, BrowserSession, ScreenshotOptions,
//!     ScrollOptions,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = BrowserSession::launch().await?;
//!     cookie_load(&session, "state/cookies.json").await?;
//!     session.navigate("https://example.com/feed").await?;
//!
//!     let outcome = autoscroll(
//!         &session,
//!         "#feed > article:last-child",
//!         &ScrollOptions::default(),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//!     println!("Loaded {} pages of content", outcome.iterations);
//!
//!     save_screenshot(&session, "tmp/screenshots", "feed", &ScreenshotOptions::default()).await?;
//!     cookie_save(&session, "state/cookies.json").await?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`driver`]: the [`PageDriver`] capability every helper takes explicitly
//! - [`browser`]: [`BrowserSession`], the Chrome DevTools implementation
//! - [`scroll`]: content- and offset-based scroll loops
//! - [`forms`], [`click`], [`wait`]: interaction and waiting helpers
//! - [`screenshot`], [`persist`]: writing page state to disk
//! - [`script`]: JavaScript and XPath snippet builders

pub mod browser;
pub mod click;
pub mod driver;
pub mod error;
pub mod forms;
pub mod persist;
pub mod screenshot;
pub mod script;
pub mod scroll;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use browser::{BrowserConfig, BrowserSession};
pub use click::{click_element_with_text, click_element_with_text_bubbling, TextClick};
pub use driver::{element_markup, CaptureRequest, ElementLocator, ImageFormat, PageDriver, StorageKind};
pub use error::{PageError, Result};
pub use forms::{
    input_clear, input_set_value, input_type, select_option_by_text, select_option_by_value,
    SelectOptions, SetValueOutcome,
};
pub use persist::{cookie_load, cookie_save, storage_load, storage_save, CookieRecord};
pub use screenshot::{jpeg_file_name, save_screenshot, ScreenshotOptions};
pub use script::TextMatch;
pub use scroll::{
    autoscroll, scroll_to_bottom, scroll_to_bottom_smooth, AutoscrollOutcome, BottomScrollOptions,
    ScrollOptions, ScrollToBottomOutcome,
};
pub use wait::{wait_for_text_on_page, wait_for_url_containing, WaitOptions};
