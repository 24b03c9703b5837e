//! Facebook page locations, selectors and in-page scripts.
//!
//! XPath text matches assume the English interface, which is why a delete
//! run switches the account's language first.

use cinder_browser::script::js_string;

pub const HOME_URL: &str = "https://www.facebook.com/";
pub const PROFILE_URL: &str = "https://www.facebook.com/me";

/// Top bar only rendered for a signed-in user.
pub const SIGNED_IN_BANNER: &str = r#"div[role="banner"]"#;

pub const DIALOG: &str = r#"div[role="dialog"]"#;
pub const DIALOG_RADIO: &str = r#"input[type="radio"]"#;
pub const DIALOG_CLOSE: &str = r#"[aria-label="Close"]"#;

pub const MANAGE_POSTS_BUTTON: &str = "//span[text()='Manage posts']";
pub const NEXT_BUTTON: &str = "//div[@role='dialog']//span[text()='Next']";
pub const DELETE_POSTS_OPTION: &str = "//div[@role='dialog']//span[text()='Delete posts']";
pub const DONE_BUTTON: &str = "//div[@role='dialog']//span[text()='Done']";

/// Ticks every unticked post in the manage-posts dialog; returns how many.
pub const SELECT_DIALOG_POSTS: &str = r#"(() => {
  let selected = 0;
  for (const box of document.querySelectorAll('div[role="dialog"] [role="checkbox"][aria-checked="false"]')) {
    box.click();
    selected += 1;
  }
  return selected;
})()"#;

/// Script posting a UI locale change; resolves to the HTTP status or `0`.
pub fn save_locale(locale: &str) -> String {
    format!(
        "(async () => {{ try {{ const input = document.querySelector('input[name=\"fb_dtsg\"]'); const token = input ? input.value : require('DTSGInitialData').token; const body = new URLSearchParams({{ loc: {}, fb_dtsg: token }}); const r = await fetch('/intl/ajax/save_locale/', {{ method: 'POST', credentials: 'include', body }}); return r.status; }} catch (e) {{ return 0; }} }})()",
        js_string(locale)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_locale_quotes_locale() {
        let script = save_locale("de_DE");
        assert!(script.contains(r#"loc: "de_DE""#));
        assert!(script.contains("save_locale"));
    }
}
