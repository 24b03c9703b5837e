//! Anticipated Facebook failures.

use cinder_runner::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacebookFailure {
    ManagePostsButtonNotClicked,
    DialogDidNotAppear,
    LanguageNotDetected,
    LanguageNotChanged,
}

impl FailureKind for FacebookFailure {
    fn code(&self) -> &'static str {
        match self {
            Self::ManagePostsButtonNotClicked => "failed_to_click_manage_posts_button",
            Self::DialogDidNotAppear => "dialog_did_not_appear",
            Self::LanguageNotDetected => "language_not_detected",
            Self::LanguageNotChanged => "language_not_changed",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::ManagePostsButtonNotClicked => "failed to click Manage-posts button",
            Self::DialogDidNotAppear => "dialog did not appear",
            Self::LanguageNotDetected => "could not read the interface language",
            Self::LanguageNotChanged => "interface language did not change",
        }
        .to_string()
    }
}
