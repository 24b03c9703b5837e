//! In-page script builders.
//!
//! Every argument is embedded as a JSON string literal so selectors and
//! XPath expressions containing quotes cannot break out of the script.

/// Quote a value as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

pub fn click_selector(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); if (!el) return false; el.click(); return true; }})()",
        js_string(selector)
    )
}

pub fn click_xpath(xpath: &str) -> String {
    format!(
        "(() => {{ const el = document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; if (!el) return false; el.click(); return true; }})()",
        js_string(xpath)
    )
}

pub fn selector_exists(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_string(selector))
}

pub fn count_selector(selector: &str) -> String {
    format!("document.querySelectorAll({}).length", js_string(selector))
}

pub fn selector_within_selector_exists(outer: &str, inner: &str) -> String {
    format!(
        "(() => {{ const outer = document.querySelector({}); return outer !== null && outer.querySelector({}) !== null; }})()",
        js_string(outer),
        js_string(inner)
    )
}

pub fn click_within_selector(outer: &str, inner: &str) -> String {
    format!(
        "(() => {{ const outer = document.querySelector({}); if (!outer) return false; const el = outer.querySelector({}); if (!el) return false; el.click(); return true; }})()",
        js_string(outer),
        js_string(inner)
    )
}

pub fn focus_selector(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); if (!el) return false; el.focus(); return true; }})()",
        js_string(selector)
    )
}

pub fn text_of(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.textContent : null; }})()",
        js_string(selector)
    )
}

pub fn attribute_of(selector: &str, name: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.getAttribute({}) : null; }})()",
        js_string(selector),
        js_string(name)
    )
}

pub fn cookie(name: &str) -> String {
    format!(
        "(() => {{ const prefix = {} + '='; const hit = document.cookie.split('; ').find(c => c.startsWith(prefix)); return hit ? decodeURIComponent(hit.substring(prefix.length)) : null; }})()",
        js_string(name)
    )
}

pub const SCROLL_TO_BOTTOM: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

pub const SCROLL_TO_TOP: &str = "(() => { window.scrollTo(0, 0); return true; })()";

pub const IS_ONLINE: &str = "navigator.onLine";

pub const DOCUMENT_LANGUAGE: &str = "document.documentElement.lang";
