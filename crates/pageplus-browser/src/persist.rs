//! Cookie and web storage persistence
//!
//! Saving writes a full snapshot as pretty-printed JSON, replacing whatever
//! the file held. Loading is additive: every saved entry is written back into
//! the live page, existing entries that were not saved are left alone. A
//! missing file loads as nothing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info};

use crate::driver::{PageDriver, StorageKind};
use crate::error::{PageError, Result};

/// One browser cookie as stored on disk
///
/// Field names follow the DevTools protocol. Fields beyond the common set
/// (size, priority, source scheme, ...) are kept in `extra` so a saved jar
/// is a complete snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Seconds since the epoch, negative for session cookies
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl CookieRecord {
    /// Session cookie on `domain` with path `/`
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: session_expiry(),
            http_only: false,
            secure: false,
            same_site: None,
            extra: Map::new(),
        }
    }

    pub fn is_session(&self) -> bool {
        self.expires < 0.0
    }

    /// The subset of fields a browser accepts when setting a cookie
    pub fn to_set_params(&self) -> Value {
        let mut params = Map::new();
        params.insert("name".into(), Value::from(self.name.clone()));
        params.insert("value".into(), Value::from(self.value.clone()));
        if !self.domain.is_empty() {
            params.insert("domain".into(), Value::from(self.domain.clone()));
        }
        params.insert("path".into(), Value::from(self.path.clone()));
        params.insert("secure".into(), Value::from(self.secure));
        params.insert("httpOnly".into(), Value::from(self.http_only));
        if let Some(same_site) = &self.same_site {
            params.insert("sameSite".into(), Value::from(same_site.clone()));
        }
        if !self.is_session() {
            params.insert("expires".into(), Value::from(self.expires));
        }
        Value::Object(params)
    }
}

/// Write every cookie of the page to `path`, returning how many were saved
pub async fn cookie_save<D>(driver: &D, path: impl AsRef<Path>) -> Result<usize>
where
    D: PageDriver + ?Sized,
{
    let path = path.as_ref();
    let cookies = driver.cookies().await?;
    write_json(path, &cookies).await?;

    info!("Saved {} cookies to {}", cookies.len(), path.display());
    Ok(cookies.len())
}

/// Set every cookie saved in `path`, returning how many were loaded
///
/// A missing file loads nothing and is not an error.
pub async fn cookie_load<D>(driver: &D, path: impl AsRef<Path>) -> Result<usize>
where
    D: PageDriver + ?Sized,
{
    let path = path.as_ref();
    let Some(cookies) = read_json_if_exists::<Vec<CookieRecord>>(path).await? else {
        debug!("No cookie file at {}, nothing to load", path.display());
        return Ok(0);
    };

    let count = cookies.len();
    if count > 0 {
        driver.set_cookies(cookies).await?;
    }

    info!("Loaded {} cookies from {}", count, path.display());
    Ok(count)
}

/// Write one browser store to `path`, returning how many entries were saved
pub async fn storage_save<D>(driver: &D, kind: StorageKind, path: impl AsRef<Path>) -> Result<usize>
where
    D: PageDriver + ?Sized,
{
    let path = path.as_ref();
    let entries = driver.storage_entries(kind).await?;
    write_json(path, &entries).await?;

    info!(
        "Saved {} {} entries to {}",
        entries.len(),
        kind.js_name(),
        path.display()
    );
    Ok(entries.len())
}

/// Write every entry saved in `path` into one browser store
///
/// A missing file loads nothing and is not an error.
pub async fn storage_load<D>(driver: &D, kind: StorageKind, path: impl AsRef<Path>) -> Result<usize>
where
    D: PageDriver + ?Sized,
{
    let path = path.as_ref();
    let Some(entries) = read_json_if_exists::<BTreeMap<String, String>>(path).await? else {
        debug!("No storage file at {}, nothing to load", path.display());
        return Ok(0);
    };

    for (key, value) in &entries {
        driver.set_storage_item(kind, key, value).await?;
    }

    info!(
        "Loaded {} {} entries from {}",
        entries.len(),
        kind.js_name(),
        path.display()
    );
    Ok(entries.len())
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PageError::file(parent, e))?;
    }

    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)
        .await
        .map_err(|e| PageError::file(path, e))
}

async fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PageError::file(path, e)),
    }
}
