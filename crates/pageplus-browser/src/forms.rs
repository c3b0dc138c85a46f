//! Form control helpers: selects, text inputs, radios and checkboxes

use std::time::Duration;

use pageplus_core::FormsConfig;
use serde_json::Value;
use tracing::{debug, info};

use crate::driver::PageDriver;
use crate::error::{PageError, Result};
use crate::script;

/// Timing for [`select_option_by_text`]
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOptions {
    /// How long to wait for the control to appear
    pub selector_timeout: Duration,
    /// Pause after opening the control and after choosing an option
    pub settle: Duration,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self::from_config(&FormsConfig::default())
    }
}

impl SelectOptions {
    pub fn from_config(config: &FormsConfig) -> Self {
        Self {
            selector_timeout: Duration::from_millis(config.selector_timeout_ms),
            settle: Duration::from_millis(config.option_settle_ms),
        }
    }
}

/// What [`input_set_value`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetValueOutcome {
    /// A text-like control had its value replaced
    Value,
    /// A radio or checkbox group had the matching control checked
    Checked,
}

/// Open a `<select>`, choose the option whose visible text equals `text`
///
/// The `change` event is dispatched on the select, then focus is moved away
/// by clicking `body`. Fails with [`PageError::OptionNotFound`] when no option
/// has exactly that text.
pub async fn select_option_by_text<D>(
    driver: &D,
    selector: &str,
    text: &str,
    options: &SelectOptions,
) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    debug!("Selecting option \"{}\" in {}", text, selector);

    driver
        .wait_for_selector(selector, options.selector_timeout)
        .await?;
    driver.click(selector).await?;
    tokio::time::sleep(options.settle).await;

    let status = driver
        .evaluate(&script::select_option_by_text(selector, text))
        .await?;
    match status.as_str() {
        Some("ok") => {}
        Some("no-option") => {
            return Err(PageError::OptionNotFound {
                selector: selector.to_string(),
                text: text.to_string(),
            })
        }
        Some("no-select") => return Err(PageError::NotFound(selector.to_string())),
        _ => {
            return Err(PageError::Script(format!(
                "select by text on {} returned {}",
                selector, status
            )))
        }
    }

    tokio::time::sleep(options.settle).await;
    driver.click("body").await?;
    tokio::time::sleep(options.settle).await;

    info!("Selected option \"{}\" in {}", text, selector);
    Ok(())
}

/// Select the option(s) of a `<select>` whose `value` attribute matches
pub async fn select_option_by_value<D>(driver: &D, selector: &str, value: &str) -> Result<Vec<String>>
where
    D: PageDriver + ?Sized,
{
    debug!("Selecting value {} in {}", value, selector);
    driver.select_value(selector, &[value]).await
}

/// Empty a text input, usually before typing a new value
pub async fn input_clear<D>(driver: &D, selector: &str) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    let cleared = driver.evaluate(&script::input_clear(selector)).await?;
    if cleared.as_bool() == Some(true) {
        Ok(())
    } else {
        Err(PageError::NotFound(selector.to_string()))
    }
}

/// Focus an input by clicking it and type `text` as keystrokes
pub async fn input_type<D>(driver: &D, selector: &str, text: &str, timeout: Duration) -> Result<()>
where
    D: PageDriver + ?Sized,
{
    driver.wait_for_selector(selector, timeout).await?;
    driver.click(selector).await?;
    driver.type_text(text).await
}

/// Set an input's value directly, without keystrokes
///
/// For radio and checkbox groups matched by `selector`, the control whose
/// `value` equals `value` is checked and the others are unchecked. Fails with
/// [`PageError::OptionNotFound`] when no control in the group matches.
pub async fn input_set_value<D>(driver: &D, selector: &str, value: &str) -> Result<SetValueOutcome>
where
    D: PageDriver + ?Sized,
{
    let status = driver
        .evaluate(&script::input_set_value(selector, value))
        .await?;

    match status {
        Value::String(s) if s == "value" => Ok(SetValueOutcome::Value),
        Value::String(s) if s == "checked" => Ok(SetValueOutcome::Checked),
        Value::String(s) if s == "no-match" => Err(PageError::OptionNotFound {
            selector: selector.to_string(),
            text: value.to_string(),
        }),
        Value::String(s) if s == "missing" => Err(PageError::NotFound(selector.to_string())),
        other => Err(PageError::Script(format!(
            "set value on {} returned {}",
            selector, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeElement, FakePage};

    fn page_with_select() -> FakePage {
        let page = FakePage::new();
        page.add_element("#state", FakeElement::text("Alabama Alaska"));
        page
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_option_by_text_clicks_select_then_body() {
        let page = page_with_select();
        page.reply_to_script("querySelectorAll('option')", Value::from("ok"));

        select_option_by_text(&page, "#state", "Alaska", &SelectOptions::default())
            .await
            .unwrap();

        assert_eq!(page.clicks(), vec!["css:#state", "css:body"]);
        let scripts = page.scripts();
        assert!(scripts[0].contains("o.text === \"Alaska\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_option_by_text_missing_option_fails_loudly() {
        let page = page_with_select();
        page.reply_to_script("querySelectorAll('option')", Value::from("no-option"));

        let err = select_option_by_text(&page, "#state", "Atlantis", &SelectOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PageError::OptionNotFound { ref selector, ref text } if selector == "#state" && text == "Atlantis"
        ));
        // body is never clicked after a failed selection
        assert_eq!(page.clicks(), vec!["css:#state"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_option_by_text_select_never_appears() {
        let page = FakePage::new();

        let err = select_option_by_text(&page, "#missing", "x", &SelectOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("#missing"));
    }

    #[tokio::test]
    async fn test_select_option_by_value_returns_selection() {
        let page = page_with_select();
        page.reply_to_script("const wanted", Value::from(r#"["AK"]"#));

        let selected = select_option_by_value(&page, "#state", "AK").await.unwrap();
        assert_eq!(selected, vec!["AK"]);
        assert!(page.scripts()[0].contains("const wanted = [\"AK\"]"));
    }

    #[tokio::test]
    async fn test_input_clear_missing_input() {
        let page = FakePage::new();
        page.reply_to_script("el.value = ''", Value::Bool(false));

        let err = input_clear(&page, "#email").await.unwrap_err();
        assert!(matches!(err, PageError::NotFound(ref s) if s == "#email"));
    }

    #[tokio::test]
    async fn test_input_clear_ok() {
        let page = FakePage::new();
        page.reply_to_script("el.value = ''", Value::Bool(true));
        input_clear(&page, "#email").await.unwrap();
    }

    #[tokio::test]
    async fn test_input_type_focuses_then_types() {
        let page = FakePage::new();
        page.add_element("#q", FakeElement::text(""));

        input_type(&page, "#q", "rust async", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(page.clicks(), vec!["css:#q"]);
        assert_eq!(page.typed(), vec!["rust async"]);
    }

    #[tokio::test]
    async fn test_input_set_value_outcomes() {
        let page = FakePage::new();
        page.reply_to_script("[name=plan]", Value::from("checked"));
        page.reply_to_script("#zip", Value::from("value"));
        page.reply_to_script("[name=size]", Value::from("no-match"));
        page.reply_to_script("#gone", Value::from("missing"));

        assert_eq!(
            input_set_value(&page, "input[name=plan]", "pro").await.unwrap(),
            SetValueOutcome::Checked
        );
        assert_eq!(
            input_set_value(&page, "#zip", "90210").await.unwrap(),
            SetValueOutcome::Value
        );
        assert!(matches!(
            input_set_value(&page, "input[name=size]", "xxl").await.unwrap_err(),
            PageError::OptionNotFound { .. }
        ));
        assert!(input_set_value(&page, "#gone", "1")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
