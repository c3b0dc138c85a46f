//! Configuration management for pageplus
//!
//! Timing constants for the scroll loops, form helpers and waits are tuned
//! per site, so they live in a config file instead of being hard-coded.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{PageError, Result};

/// Top-level pageplus configuration
///
/// Loaded from `.pageplus/config.toml` under a project root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagePlusConfig {
    /// Scroll loop timing
    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Form control timing
    #[serde(default)]
    pub forms: FormsConfig,

    /// Bounded waits
    #[serde(default)]
    pub waits: WaitsConfig,

    /// Screenshot encoding
    #[serde(default)]
    pub screenshot: ScreenshotConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserLaunchConfig,
}

/// Scroll loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Interval between autoscroll ticks
    #[serde(default = "default_autoscroll_interval_ms")]
    pub autoscroll_interval_ms: u64,

    /// Pause after scrolling the last item into view
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Backward nudge that fires scroll listeners
    #[serde(default = "default_nudge_px")]
    pub nudge_px: f64,

    /// Interval between scroll-to-bottom ticks
    #[serde(default = "default_bottom_interval_ms")]
    pub bottom_interval_ms: u64,
}

/// Form control timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormsConfig {
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Pause while a select control opens and after an option is chosen
    #[serde(default = "default_option_settle_ms")]
    pub option_settle_ms: u64,
}

/// Bounded waits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitsConfig {
    #[serde(default = "default_click_timeout_ms")]
    pub click_timeout_ms: u64,

    #[serde(default = "default_bubbling_click_timeout_ms")]
    pub bubbling_click_timeout_ms: u64,

    #[serde(default = "default_text_timeout_ms")]
    pub text_timeout_ms: u64,

    #[serde(default = "default_text_poll_ms")]
    pub text_poll_ms: u64,

    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

/// Screenshot encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    /// JPEG quality (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,

    #[serde(default = "default_true")]
    pub full_page: bool,
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserLaunchConfig {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Default element wait in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

// Default value providers
fn default_autoscroll_interval_ms() -> u64 {
    3400
}

fn default_settle_delay_ms() -> u64 {
    700
}

fn default_nudge_px() -> f64 {
    10.0
}

fn default_bottom_interval_ms() -> u64 {
    100
}

fn default_selector_timeout_ms() -> u64 {
    5000
}

fn default_option_settle_ms() -> u64 {
    1300
}

fn default_click_timeout_ms() -> u64 {
    13000
}

fn default_bubbling_click_timeout_ms() -> u64 {
    5000
}

fn default_text_timeout_ms() -> u64 {
    60000
}

fn default_text_poll_ms() -> u64 {
    250
}

fn default_response_timeout_ms() -> u64 {
    30000
}

fn default_quality() -> u8 {
    70
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_timeout_seconds() -> u64 {
    30
}

impl PagePlusConfig {
    /// Load configuration from `.pageplus/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".pageplus/config.toml");

        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| PageError::file(&config_path, e))?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PageError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Write default configuration to `.pageplus/config.toml`
    pub fn write_default(root: &Path) -> Result<()> {
        let config_dir = root.join(".pageplus");
        std::fs::create_dir_all(&config_dir).map_err(|e| PageError::file(&config_dir, e))?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| PageError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content).map_err(|e| PageError::file(&config_path, e))?;
        Ok(())
    }
}

impl ScrollConfig {
    pub fn autoscroll_interval(&self) -> Duration {
        Duration::from_millis(self.autoscroll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn bottom_interval(&self) -> Duration {
        Duration::from_millis(self.bottom_interval_ms)
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            autoscroll_interval_ms: default_autoscroll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            nudge_px: default_nudge_px(),
            bottom_interval_ms: default_bottom_interval_ms(),
        }
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            selector_timeout_ms: default_selector_timeout_ms(),
            option_settle_ms: default_option_settle_ms(),
        }
    }
}

impl Default for WaitsConfig {
    fn default() -> Self {
        Self {
            click_timeout_ms: default_click_timeout_ms(),
            bubbling_click_timeout_ms: default_bubbling_click_timeout_ms(),
            text_timeout_ms: default_text_timeout_ms(),
            text_poll_ms: default_text_poll_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            full_page: true,
        }
    }
}

impl Default for BrowserLaunchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PagePlusConfig::default();
        assert_eq!(config.scroll.autoscroll_interval_ms, 3400);
        assert_eq!(config.scroll.settle_delay_ms, 700);
        assert_eq!(config.scroll.nudge_px, 10.0);
        assert_eq!(config.scroll.bottom_interval_ms, 100);
        assert_eq!(config.forms.option_settle_ms, 1300);
        assert_eq!(config.waits.click_timeout_ms, 13000);
        assert_eq!(config.waits.text_timeout_ms, 60000);
        assert_eq!(config.screenshot.quality, 70);
        assert!(config.screenshot.full_page);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = PagePlusConfig::from_toml(
            r#"
            [scroll]
            settle_delay_ms = 1200
            nudge_px = 25.0
            "#,
        )
        .unwrap();

        assert_eq!(config.scroll.settle_delay(), Duration::from_millis(1200));
        assert_eq!(config.scroll.nudge_px, 25.0);
        assert_eq!(config.scroll.autoscroll_interval_ms, 3400);
        assert_eq!(config.waits, WaitsConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = PagePlusConfig::from_toml("[scroll]\nnudge_px = \"far\"").unwrap_err();
        assert!(matches!(err, PageError::Config(_)));
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = PagePlusConfig::load_or_default(temp_dir.path()).unwrap();
        assert_eq!(config, PagePlusConfig::default());
    }

    #[test]
    fn test_write_default_then_load() {
        let temp_dir = TempDir::new().unwrap();
        PagePlusConfig::write_default(temp_dir.path()).unwrap();
        assert!(temp_dir.path().join(".pageplus/config.toml").exists());

        let config = PagePlusConfig::load_or_default(temp_dir.path()).unwrap();
        assert_eq!(config, PagePlusConfig::default());
    }
}
