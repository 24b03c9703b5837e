//! Save, switch and restore the account's interface language.

use crate::failure::FacebookFailure;
use crate::jobs::FacebookJobType;
use crate::platform::FacebookPlatform;
use crate::selectors::{save_locale, HOME_URL};
use cinder_runner::{AutomationSession, JobContext, Result, RunnerError};

/// Account config key holding the language found before the run.
pub const USER_LANG_KEY: &str = "userLang";
pub const ENGLISH_LOCALE: &str = "en_US";

pub(crate) fn is_english(lang: &str) -> bool {
    let lang = lang.to_ascii_lowercase();
    lang == "en" || lang.starts_with("en-") || lang.starts_with("en_")
}

async fn post_locale(
    session: &AutomationSession,
    job_type: FacebookJobType,
    locale: &str,
) -> Result<()> {
    let status = session
        .dom()
        .safe_execute_javascript::<Option<u16>>(&save_locale(locale), Some("save locale"))
        .await
        .ok()
        .flatten()
        .unwrap_or(0);
    if (200..300).contains(&status) {
        return Ok(());
    }
    tracing::warn!(job_type = %job_type, locale, status, "locale change rejected");
    session.log(format!("locale change to {locale} returned status {status}"));
    Err(RunnerError::job(job_type, &FacebookFailure::LanguageNotChanged))
}

/// Record the current language. Already English means there is nothing to
/// switch, so the switch and restore jobs are canceled.
pub(crate) async fn save_user_lang(ctx: &mut JobContext<'_, FacebookPlatform>) -> Result<()> {
    let session = ctx.session;
    session.load_url_with_rate_limit(HOME_URL, &[], true).await?;
    let lang = session.dom().document_language().await.ok_or_else(|| {
        RunnerError::job(FacebookJobType::SaveUserLang, &FacebookFailure::LanguageNotDetected)
    })?;

    session.set_config(USER_LANG_KEY, &lang).await?;
    session.log(format!("interface language is {lang}"));
    ctx.progress_mut().user_lang = Some(lang.clone());

    if is_english(&lang) {
        let canceled = ctx
            .cancel_pending_jobs(|job| job.is_language_switch())
            .await?;
        session.log(format!("already English, canceled {canceled} language jobs"));
    }
    ctx.checkpoint().await
}

pub(crate) async fn set_lang_to_english(
    ctx: &mut JobContext<'_, FacebookPlatform>,
) -> Result<()> {
    let session = ctx.session;
    session
        .dom_step("switch language", || {
            post_locale(session, FacebookJobType::SetLangToEnglish, ENGLISH_LOCALE)
        })
        .await?;

    session.load_url_with_rate_limit(HOME_URL, &[], true).await?;
    match session.dom().document_language().await {
        Some(lang) if is_english(&lang) => Ok(()),
        _ => Err(RunnerError::job(
            FacebookJobType::SetLangToEnglish,
            &FacebookFailure::LanguageNotChanged,
        )),
    }
}

/// Switch back to the saved language; nothing saved means nothing to do.
pub(crate) async fn restore_user_lang(
    ctx: &mut JobContext<'_, FacebookPlatform>,
) -> Result<()> {
    let session = ctx.session;
    let saved = match session.get_config(USER_LANG_KEY).await? {
        Some(lang) => Some(lang),
        None => ctx.progress().user_lang.clone(),
    };
    let Some(lang) = saved else {
        session.log("no saved language to restore");
        return Ok(());
    };

    session
        .dom_step("restore language", || {
            post_locale(session, FacebookJobType::RestoreUserLang, &lang)
        })
        .await?;
    session.log(format!("restored interface language {lang}"));
    Ok(())
}
