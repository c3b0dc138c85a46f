//! Screenshot capture to disk

use std::path::{Path, PathBuf};

use pageplus_core::ScreenshotConfig;
use tokio::fs;
use tracing::{debug, info};

use crate::driver::{CaptureRequest, ImageFormat, PageDriver};
use crate::error::{PageError, Result};

/// Screenshot capture options
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotOptions {
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Capture the whole scrollable page instead of the viewport
    pub full_page: bool,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self::from_config(&ScreenshotConfig::default())
    }
}

impl ScreenshotOptions {
    pub fn from_config(config: &ScreenshotConfig) -> Self {
        Self {
            quality: config.quality,
            full_page: config.full_page,
        }
    }

    /// Viewport-only capture
    pub fn viewport() -> Self {
        Self {
            full_page: false,
            ..Self::default()
        }
    }

    fn to_request(&self) -> Result<CaptureRequest> {
        if !(1..=100).contains(&self.quality) {
            return Err(PageError::InvalidInput(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        Ok(CaptureRequest {
            format: ImageFormat::Jpeg,
            quality: Some(self.quality),
            full_page: self.full_page,
        })
    }
}

/// File name with a `.jpg` extension, appended when missing
pub fn jpeg_file_name(file_name: &str) -> String {
    let extension = ImageFormat::Jpeg.extension();
    if Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext == extension)
    {
        file_name.to_string()
    } else {
        format!("{}.{}", file_name, extension)
    }
}

/// Capture a JPEG screenshot into `dir`, creating the directory if needed
///
/// `file_name` may be given with or without the `.jpg` extension; both
/// `"shot"` and `"shot.jpg"` write `dir/shot.jpg`. Returns the written path.
pub async fn save_screenshot<D>(
    driver: &D,
    dir: impl AsRef<Path>,
    file_name: &str,
    options: &ScreenshotOptions,
) -> Result<PathBuf>
where
    D: PageDriver + ?Sized,
{
    if file_name.trim().is_empty() {
        return Err(PageError::InvalidInput(
            "screenshot file name is empty".to_string(),
        ));
    }
    let request = options.to_request()?;

    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .await
        .map_err(|e| PageError::file(dir, e))?;
    let file_path = dir.join(jpeg_file_name(file_name));

    debug!(
        "Capturing {} screenshot (quality {})",
        if options.full_page { "full page" } else { "viewport" },
        options.quality
    );
    let data = driver.capture_screenshot(&request).await?;

    fs::write(&file_path, &data)
        .await
        .map_err(|e| PageError::file(&file_path, e))?;

    info!(
        "Screenshot stored: {} ({} bytes)",
        file_path.display(),
        data.len()
    );
    Ok(file_path)
}
