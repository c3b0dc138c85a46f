//! JavaScript and XPath snippet builders
//!
//! Every value interpolated into a script is encoded as a JSON string
//! literal, and every text interpolated into an XPath expression is encoded
//! as an XPath literal. Scripts that return structured data return
//! `JSON.stringify(...)` so the result survives evaluation channels that only
//! hand back primitives.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::driver::{ElementLocator, StorageKind};
use crate::error::{PageError, Result};

/// How text is matched when locating an element by its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMatch {
    /// `text()` equals the string
    Exact,
    /// `text()` contains the string
    #[default]
    Contains,
}

/// Encode a Rust string as a JavaScript string literal
pub fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Encode text as an XPath 1.0 string literal
///
/// XPath has no escape sequences, so text containing both quote kinds is
/// split and joined with `concat()`.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }
    if !text.contains('\'') {
        return format!("'{}'", text);
    }

    let parts: Vec<String> = text
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// Append a text predicate to an XPath path expression
pub fn text_xpath(path: &str, text: &str, matching: TextMatch) -> String {
    let literal = xpath_literal(text);
    match matching {
        TextMatch::Exact => format!("{}[text()={}]", path, literal),
        TextMatch::Contains => format!("{}[contains(text(), {})]", path, literal),
    }
}

/// Decode a `JSON.stringify` result
pub(crate) fn decode_json<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    match value {
        Value::String(text) => Ok(serde_json::from_str(&text)?),
        other => Err(PageError::Script(format!(
            "{} returned {} instead of a JSON string",
            what, other
        ))),
    }
}

impl ElementLocator {
    /// JavaScript expression evaluating to the element or `null`
    pub(crate) fn js_lookup(&self) -> String {
        match self {
            ElementLocator::Css(selector) => {
                format!("document.querySelector({})", js_string(selector))
            }
            ElementLocator::XPath(xpath) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(xpath)
            ),
        }
    }
}

impl StorageKind {
    /// Name of the `window` property holding this store
    pub fn js_name(&self) -> &'static str {
        match self {
            StorageKind::Local => "localStorage",
            StorageKind::Session => "sessionStorage",
        }
    }
}

// Element reads

pub(crate) fn text_content(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.textContent : null; }})()",
        js_string(selector)
    )
}

pub(crate) fn outer_html(locator: &ElementLocator) -> String {
    format!(
        "(() => {{ const el = {}; return el ? el.outerHTML : null; }})()",
        locator.js_lookup()
    )
}

// Viewport

pub(crate) fn scroll_into_view(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); if (!el) {{ return false; }} el.scrollIntoView(); return true; }})()",
        js_string(selector)
    )
}

pub(crate) fn scroll_by(dx: f64, dy: f64) -> String {
    format!("window.scrollBy({}, {}); true", dx, dy)
}

pub(crate) const SCROLL_OFFSET: &str = "document.documentElement.scrollTop";

pub(crate) const VIEWPORT_HEIGHT: &str = "window.innerHeight";

pub(crate) const SMOOTH_SCROLL_TO_BOTTOM: &str =
    "window.scrollTo({ top: document.documentElement.scrollHeight, behavior: 'smooth' }); true";

pub(crate) const DOCUMENT_SIZE: &str = "JSON.stringify({ width: document.documentElement.scrollWidth, height: document.documentElement.scrollHeight })";

// Page state

pub(crate) const PAGE_TEXT: &str = "document.body ? document.body.innerText : ''";

pub(crate) const CURRENT_URL: &str = "document.URL";

// Interaction

pub(crate) fn dispatch_click(locator: &ElementLocator) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) {{ return false; }} el.dispatchEvent(new Event('click', {{ bubbles: true, cancelable: true }})); return true; }})()",
        locator.js_lookup()
    )
}

/// Returns `"ok"`, `"no-select"` or `"no-option"`
pub(crate) fn select_option_by_text(selector: &str, text: &str) -> String {
    format!(
        r#"(() => {{
    const select = document.querySelector({sel});
    if (!select) {{ return 'no-select'; }}
    const option = [...select.querySelectorAll('option')].find(o => o.text === {txt});
    if (!option) {{ return 'no-option'; }}
    option.selected = true;
    select.dispatchEvent(new Event('change'));
    return 'ok';
}})()"#,
        sel = js_string(selector),
        txt = js_string(text)
    )
}

/// Returns the JSON list of selected values, or `"null"` when the select is missing
pub(crate) fn select_value(selector: &str, values: &[&str]) -> String {
    let values = Value::from(values.iter().map(|v| v.to_string()).collect::<Vec<_>>());
    format!(
        r#"(() => {{
    const select = document.querySelector({sel});
    if (!select) {{ return JSON.stringify(null); }}
    const wanted = {values};
    for (const option of select.options) {{
        option.selected = wanted.includes(option.value);
        if (option.selected && !select.multiple) {{ break; }}
    }}
    select.dispatchEvent(new Event('input', {{ bubbles: true }}));
    select.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return JSON.stringify([...select.options].filter(o => o.selected).map(o => o.value));
}})()"#,
        sel = js_string(selector),
        values = values
    )
}

pub(crate) fn input_clear(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); if (!el) {{ return false; }} el.value = ''; return true; }})()",
        js_string(selector)
    )
}

/// Returns `"value"`, `"checked"`, `"no-match"` or `"missing"`
pub(crate) fn input_set_value(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
    const elems = [...document.querySelectorAll({sel})];
    if (elems.length === 0) {{ return 'missing'; }}
    const val = {val};
    const first = elems[0];
    if (first.type === 'radio' || first.type === 'checkbox') {{
        let matched = false;
        for (const el of elems) {{
            el.checked = el.value === val;
            matched = matched || el.checked;
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
        }}
        return matched ? 'checked' : 'no-match';
    }}
    first.value = val;
    first.dispatchEvent(new Event('input', {{ bubbles: true }}));
    first.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return 'value';
}})()"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

// Storage

pub(crate) fn storage_entries(kind: StorageKind) -> String {
    format!(
        r#"(() => {{
    const store = window.{name};
    const entries = {{}};
    for (let i = 0; i < store.length; i++) {{
        const key = store.key(i);
        entries[key] = store.getItem(key);
    }}
    return JSON.stringify(entries);
}})()"#,
        name = kind.js_name()
    )
}

pub(crate) fn set_storage_item(kind: StorageKind, key: &str, value: &str) -> String {
    format!(
        "window.{}.setItem({}, {}); true",
        kind.js_name(),
        js_string(key),
        js_string(value)
    )
}
