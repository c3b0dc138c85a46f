//! # pageplus-core
//!
//! Shared error and configuration types for the pageplus browser helpers.
//!
//! The helpers themselves live in `pageplus-browser`; this crate only holds
//! what every helper needs to agree on:
//!
//! - [`PageError`] and the [`Result`] alias
//! - [`PagePlusConfig`], the TOML-backed timing and launch settings

pub mod config;
mod error;

pub use config::{
    BrowserLaunchConfig, FormsConfig, PagePlusConfig, ScreenshotConfig, ScrollConfig,
    WaitsConfig,
};
pub use error::{PageError, Result};
