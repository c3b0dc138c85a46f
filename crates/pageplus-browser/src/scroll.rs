//! Scroll loops that stop once the page stops changing
//!
//! Both loops share one shape: wait an interval, nudge the page, observe a
//! value, stop when the value equals the one observed on the previous tick.
//! A tick body always finishes before the next interval starts, so slow
//! settle delays never overlap with the next observation.
//!
//! Every loop takes a [`CancellationToken`]; cancelling it ends the loop with
//! [`PageError::Cancelled`] at the next wait.

use std::time::Duration;

use pageplus_core::ScrollConfig;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::driver::PageDriver;
use crate::error::{PageError, Result};
use crate::script;

/// Timing for [`autoscroll`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOptions {
    /// Wait before every observation
    pub interval: Duration,
    /// Pause after scrolling the last item into view, lets lazy content start loading
    pub settle_delay: Duration,
    /// Pixels to scroll back up after settling, fires scroll listeners
    pub nudge: f64,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self::from_config(&ScrollConfig::default())
    }
}

impl ScrollOptions {
    pub fn from_config(config: &ScrollConfig) -> Self {
        Self {
            interval: config.autoscroll_interval(),
            settle_delay: config.settle_delay(),
            nudge: config.nudge_px,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(PageError::InvalidInput(
                "autoscroll interval must be greater than zero".to_string(),
            ));
        }
        if !self.nudge.is_finite() {
            return Err(PageError::InvalidInput(format!(
                "autoscroll nudge must be finite, got {}",
                self.nudge
            )));
        }
        Ok(())
    }
}

/// Timing for [`scroll_to_bottom`]
#[derive(Debug, Clone, PartialEq)]
pub struct BottomScrollOptions {
    pub interval: Duration,
}

impl Default for BottomScrollOptions {
    fn default() -> Self {
        Self::from_config(&ScrollConfig::default())
    }
}

impl BottomScrollOptions {
    pub fn from_config(config: &ScrollConfig) -> Self {
        Self {
            interval: config.bottom_interval(),
        }
    }
}

/// Result of [`autoscroll`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoscrollOutcome {
    /// Text of the last item when the page stopped growing
    pub last_content: String,
    /// Ticks that saw new content
    pub iterations: usize,
}

/// Result of [`scroll_to_bottom`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollToBottomOutcome {
    /// Vertical offset at the bottom
    pub scroll_offset: f64,
    /// Ticks that moved the viewport
    pub iterations: usize,
}

/// Per-invocation loop state
#[derive(Debug)]
struct ScrollState<T> {
    last_observed: T,
    iterations: usize,
}

impl<T: PartialEq> ScrollState<T> {
    fn new(initial: T) -> Self {
        Self {
            last_observed: initial,
            iterations: 0,
        }
    }

    /// Record an observation, returning `false` once it repeats
    fn advance(&mut self, observed: T) -> bool {
        if self.last_observed == observed {
            return false;
        }
        self.last_observed = observed;
        self.iterations += 1;
        true
    }

    /// Replace the baseline without counting a tick
    fn rebase(&mut self, observed: T) {
        self.last_observed = observed;
    }
}

/// Sleep unless cancelled first
async fn pause(duration: Duration, cancel: &CancellationToken, routine: &str, iterations: usize) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PageError::Cancelled(format!(
            "{} after {} iterations",
            routine, iterations
        ))),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Scroll a lazily loading list until its last item stops changing
///
/// Every `interval` the text of the element matched by `selector` (for
/// example `table > tbody > tr:last-child`) is read. If it equals the
/// baseline the page is considered fully loaded. Otherwise the element is
/// scrolled into view, the page settles for `settle_delay`, the viewport is
/// nudged back up by `nudge` pixels to trigger loading, and the text read
/// after the nudge becomes the new baseline.
///
/// Fails with [`PageError::NotFound`] as soon as `selector` matches nothing.
pub async fn autoscroll<D>(
    driver: &D,
    selector: &str,
    options: &ScrollOptions,
    cancel: &CancellationToken,
) -> Result<AutoscrollOutcome>
where
    D: PageDriver + ?Sized,
{
    options.validate()?;
    let mut state: ScrollState<Option<String>> = ScrollState::new(None);

    loop {
        pause(options.interval, cancel, "autoscroll", state.iterations).await?;

        let content = driver
            .text_content(selector)
            .await?
            .ok_or_else(|| PageError::NotFound(selector.to_string()))?;

        if !state.advance(Some(content.clone())) {
            info!(
                "Autoscroll of {} finished after {} iterations",
                selector, state.iterations
            );
            return Ok(AutoscrollOutcome {
                last_content: content,
                iterations: state.iterations,
            });
        }

        debug!("Autoscroll tick {}: new content in {}", state.iterations, selector);
        driver.scroll_into_view(selector).await?;
        pause(options.settle_delay, cancel, "autoscroll", state.iterations).await?;
        driver.scroll_by(0.0, -options.nudge).await?;

        // content that loaded while settling is the baseline for the next tick
        let settled = driver
            .text_content(selector)
            .await?
            .ok_or_else(|| PageError::NotFound(selector.to_string()))?;
        state.rebase(Some(settled));
    }
}

/// Scroll down one viewport per tick until the offset stops moving
pub async fn scroll_to_bottom<D>(
    driver: &D,
    options: &BottomScrollOptions,
    cancel: &CancellationToken,
) -> Result<ScrollToBottomOutcome>
where
    D: PageDriver + ?Sized,
{
    if options.interval.is_zero() {
        return Err(PageError::InvalidInput(
            "scroll interval must be greater than zero".to_string(),
        ));
    }

    // -1 never equals a real offset, so the first tick always counts
    let mut state = ScrollState::new(-1.0_f64);

    loop {
        pause(options.interval, cancel, "scroll_to_bottom", state.iterations).await?;

        let height = driver.viewport_height().await?;
        driver.scroll_by(0.0, height).await?;
        let offset = driver.scroll_offset().await?;

        if !state.advance(offset) {
            info!(
                "Reached bottom at offset {} after {} iterations",
                offset, state.iterations
            );
            return Ok(ScrollToBottomOutcome {
                scroll_offset: offset,
                iterations: state.iterations,
            });
        }

        debug!("Scroll tick {}: offset {}", state.iterations, offset);
    }
}

/// Smooth-scroll to the bottom of the document in one command
///
/// Returns as soon as the command is issued; the animation may still be
/// running.
pub async fn scroll_to_bottom_smooth<D>(driver: &D) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    debug!("Smooth scrolling to bottom");
    driver.evaluate(script::SMOOTH_SCROLL_TO_BOTTOM).await?;
    Ok(())
}
