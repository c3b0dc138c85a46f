//! Browser helper error types - re-exports the unified PageError from pageplus-core
//!
//! Every helper fails with one of:
//! - `NotFound` / `OptionNotFound` when a selector, path or option matched nothing
//! - `Timeout` when a bounded wait elapsed
//! - `Browser` / `Script` when the driver misbehaved
//! - `File` when a cookie, storage or screenshot file could not be written or read
//!
//! Messages always carry the selector, path, URL or text involved.

pub use pageplus_core::{PageError, Result};
