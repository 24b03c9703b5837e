//! Facebook job types.

use cinder_runner::JobKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacebookJobType {
    Login,
    SaveUserLang,
    SetLangToEnglish,
    DeleteWallPosts,
    RestoreUserLang,
}

impl FacebookJobType {
    pub const ALL: [Self; 5] = [
        Self::Login,
        Self::SaveUserLang,
        Self::SetLangToEnglish,
        Self::DeleteWallPosts,
        Self::RestoreUserLang,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::SaveUserLang => "saveUserLang",
            Self::SetLangToEnglish => "setLangToEnglish",
            Self::DeleteWallPosts => "deleteWallPosts",
            Self::RestoreUserLang => "restoreUserLang",
        }
    }

    /// Jobs that only exist to switch the UI language and back.
    pub fn is_language_switch(&self) -> bool {
        matches!(self, Self::SetLangToEnglish | Self::RestoreUserLang)
    }
}

impl fmt::Display for FacebookJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacebookJobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| format!("unknown Facebook job type '{s}'"))
    }
}

impl JobKind for FacebookJobType {
    fn describe(&self) -> String {
        match self {
            Self::Login => "Logging in",
            Self::SaveUserLang => "Saving your language settings",
            Self::SetLangToEnglish => "Switching Facebook to English",
            Self::DeleteWallPosts => "Deleting your wall posts",
            Self::RestoreUserLang => "Restoring your language settings",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_parse_back() {
        for job in FacebookJobType::ALL {
            assert_eq!(job.as_str().parse::<FacebookJobType>(), Ok(job));
        }
    }

    #[test]
    fn test_language_switch_jobs() {
        let switches: Vec<_> = FacebookJobType::ALL
            .into_iter()
            .filter(FacebookJobType::is_language_switch)
            .collect();
        assert_eq!(
            switches,
            [
                FacebookJobType::SetLangToEnglish,
                FacebookJobType::RestoreUserLang
            ]
        );
    }
}
