//! Facebook wizard options.

use crate::jobs::FacebookJobType;
use cinder_runner::WizardStep;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacebookOptionsPage {
    Delete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacebookOptions {
    pub delete_wall_posts: bool,
}

impl FacebookOptions {
    /// Deleting needs the English UI, so it is wrapped in a language switch.
    pub fn define_jobs(&self) -> Vec<FacebookJobType> {
        let mut jobs = vec![FacebookJobType::Login];
        if self.delete_wall_posts {
            jobs.extend([
                FacebookJobType::SaveUserLang,
                FacebookJobType::SetLangToEnglish,
                FacebookJobType::DeleteWallPosts,
                FacebookJobType::RestoreUserLang,
            ]);
        }
        jobs
    }

    pub fn instructions(&self, step: &WizardStep<FacebookOptionsPage>) -> String {
        match step {
            WizardStep::Prestart => "Checking your Facebook account.".to_string(),
            WizardStep::Start => "You're signed in to Facebook.".to_string(),
            WizardStep::Options(FacebookOptionsPage::Delete) => {
                "Choose what to delete. Deleted posts can't be recovered.".to_string()
            }
            WizardStep::Review if self.delete_wall_posts => {
                "Ready to delete your wall posts. Facebook will be switched to English \
                 while this runs and switched back afterwards."
                    .to_string()
            }
            WizardStep::Review => {
                "Nothing selected. Go back and pick something to do.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_wraps_language_switch() {
        let options = FacebookOptions {
            delete_wall_posts: true,
        };
        assert_eq!(
            options.define_jobs(),
            vec![
                FacebookJobType::Login,
                FacebookJobType::SaveUserLang,
                FacebookJobType::SetLangToEnglish,
                FacebookJobType::DeleteWallPosts,
                FacebookJobType::RestoreUserLang,
            ]
        );
        assert_eq!(
            FacebookOptions::default().define_jobs(),
            vec![FacebookJobType::Login]
        );
    }
}
