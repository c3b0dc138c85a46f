//! In-memory `PageDriver` for unit tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::driver::{CaptureRequest, ElementLocator, PageDriver, StorageKind};
use crate::error::{PageError, Result};
use crate::persist::CookieRecord;

/// A fake element whose text changes when scrolled into view or over time
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    texts: Vec<String>,
    schedule: Vec<(Duration, String)>,
    removed_after: Option<Duration>,
    markup: Option<String>,
}

impl FakeElement {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            texts: vec![text.into()],
            ..Self::default()
        }
    }

    /// Text advances one entry per scroll-into-view and sticks on the last
    pub fn growing<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Text switches to each entry once the page has existed for its offset
    pub fn timed<I, S>(schedule: I) -> Self
    where
        I: IntoIterator<Item = (Duration, S)>,
        S: Into<String>,
    {
        Self {
            schedule: schedule.into_iter().map(|(at, t)| (at, t.into())).collect(),
            ..Self::default()
        }
    }

    /// Element disappears from the page after `after`
    pub fn removed_after(mut self, after: Duration) -> Self {
        self.removed_after = Some(after);
        self
    }

    fn present(&self, elapsed: Duration) -> bool {
        self.removed_after.map_or(true, |after| elapsed < after)
    }

    fn text_at(&self, scrolls: usize, elapsed: Duration) -> Option<String> {
        if !self.schedule.is_empty() {
            return self
                .schedule
                .iter()
                .take_while(|(at, _)| *at <= elapsed)
                .last()
                .map(|(_, text)| text.clone());
        }
        let index = scrolls.min(self.texts.len().saturating_sub(1));
        self.texts.get(index).cloned()
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Some(markup.into());
        self
    }
}

#[derive(Default)]
struct State {
    elements: HashMap<String, FakeElement>,
    scrolled_into_view: HashMap<String, usize>,
    offset: f64,
    max_offset: f64,
    viewport: f64,
    scroll_calls: Vec<(f64, f64)>,
    xpaths: HashSet<String>,
    clicks: Vec<String>,
    typed: Vec<String>,
    cookies: Vec<CookieRecord>,
    storage: HashMap<StorageKind, BTreeMap<String, String>>,
    captures: Vec<CaptureRequest>,
    responses: Vec<String>,
    page_texts: Vec<String>,
    page_text_reads: usize,
    url: String,
    script_replies: Vec<(String, Value)>,
    scripts: Vec<String>,
}

/// In-memory page
pub struct FakePage {
    state: Mutex<State>,
    created: Instant,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        let state = State {
            viewport: 100.0,
            url: "https://example.test/".to_string(),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
            created: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    pub fn add_element(&self, selector: &str, element: FakeElement) {
        self.state
            .lock()
            .unwrap()
            .elements
            .insert(selector.to_string(), element);
    }

    pub fn add_xpath(&self, xpath: &str) {
        self.state.lock().unwrap().xpaths.insert(xpath.to_string());
    }

    /// Scrollable height beyond the viewport
    pub fn set_scroll_extent(&self, max_offset: f64, viewport: f64) {
        let mut state = self.state.lock().unwrap();
        state.max_offset = max_offset;
        state.viewport = viewport;
    }

    /// Body text returned by successive reads; the last entry sticks
    pub fn set_page_texts<I, S>(&self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().unwrap().page_texts = texts.into_iter().map(Into::into).collect();
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().unwrap().url = url.to_string();
    }

    pub fn add_response(&self, url: &str) {
        self.state.lock().unwrap().responses.push(url.to_string());
    }

    /// Reply with `value` to any evaluated script containing `pattern`
    pub fn reply_to_script(&self, pattern: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .script_replies
            .push((pattern.to_string(), value));
    }

    pub fn set_storage(&self, kind: StorageKind, entries: BTreeMap<String, String>) {
        self.state.lock().unwrap().storage.insert(kind, entries);
    }

    pub fn storage(&self, kind: StorageKind) -> BTreeMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .storage
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn cookie_jar(&self) -> Vec<CookieRecord> {
        self.state.lock().unwrap().cookies.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn scroll_calls(&self) -> Vec<(f64, f64)> {
        self.state.lock().unwrap().scroll_calls.clone()
    }

    pub fn captures(&self) -> Vec<CaptureRequest> {
        self.state.lock().unwrap().captures.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().scripts.clone()
    }
}

fn timeout(what: String, after: Duration) -> PageError {
    PageError::Timeout { what, after }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn evaluate(&self, script: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.scripts.push(script.to_string());
        let reply = state
            .script_replies
            .iter()
            .find(|(pattern, _)| script.contains(pattern.as_str()))
            .map(|(_, value)| value.clone());
        Ok(reply.unwrap_or(Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if selector != "body" && !state.elements.contains_key(selector) {
            return Err(PageError::NotFound(selector.to_string()));
        }
        state.clicks.push(format!("css:{}", selector));
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, after: Duration) -> Result<()> {
        if self.state.lock().unwrap().elements.contains_key(selector) {
            Ok(())
        } else {
            Err(timeout(format!("selector {}", selector), after))
        }
    }

    async fn wait_for_xpath(&self, xpath: &str, after: Duration) -> Result<()> {
        if self.state.lock().unwrap().xpaths.contains(xpath) {
            Ok(())
        } else {
            Err(timeout(format!("xpath {}", xpath), after))
        }
    }

    async fn click_xpath(&self, xpath: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.xpaths.contains(xpath) {
            return Err(PageError::NotFound(xpath.to_string()));
        }
        state.clicks.push(format!("xpath:{}", xpath));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn set_cookies(&self, cookies: Vec<CookieRecord>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for cookie in cookies {
            state
                .cookies
                .retain(|c| !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path));
            state.cookies.push(cookie);
        }
        Ok(())
    }

    async fn capture_screenshot(&self, request: &CaptureRequest) -> Result<Vec<u8>> {
        self.state.lock().unwrap().captures.push(request.clone());
        Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
    }

    async fn wait_for_response(&self, url_fragment: &str, after: Duration) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .responses
            .iter()
            .find(|url| url.contains(url_fragment))
            .cloned()
            .ok_or_else(|| timeout(format!("response containing {}", url_fragment), after))
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        let elapsed = self.elapsed();
        let state = self.state.lock().unwrap();
        let Some(element) = state.elements.get(selector).filter(|e| e.present(elapsed)) else {
            return Ok(None);
        };
        let scrolls = state.scrolled_into_view.get(selector).copied().unwrap_or(0);
        Ok(element.text_at(scrolls, elapsed))
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock().unwrap();
        if !state.elements.get(selector).is_some_and(|e| e.present(elapsed)) {
            return Err(PageError::NotFound(selector.to_string()));
        }
        *state
            .scrolled_into_view
            .entry(selector.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.scroll_calls.push((dx, dy));
        state.offset = (state.offset + dy).clamp(0.0, state.max_offset);
        Ok(())
    }

    async fn scroll_offset(&self) -> Result<f64> {
        Ok(self.state.lock().unwrap().offset)
    }

    async fn viewport_height(&self) -> Result<f64> {
        Ok(self.state.lock().unwrap().viewport)
    }

    async fn page_text(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .page_text_reads
            .min(state.page_texts.len().saturating_sub(1));
        state.page_text_reads += 1;
        Ok(state.page_texts.get(index).cloned().unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn dispatch_click_xpath(&self, xpath: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.xpaths.contains(xpath) {
            return Err(PageError::NotFound(xpath.to_string()));
        }
        state.clicks.push(format!("event:{}", xpath));
        Ok(())
    }

    async fn outer_html(&self, locator: &ElementLocator) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .elements
            .get(locator.as_str())
            .and_then(|e| e.markup.clone())
            .ok_or_else(|| PageError::NotFound(locator.to_string()))
    }

    async fn storage_entries(&self, kind: StorageKind) -> Result<BTreeMap<String, String>> {
        Ok(self.storage(kind))
    }

    async fn set_storage_item(&self, kind: StorageKind, key: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .storage
            .entry(kind)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
