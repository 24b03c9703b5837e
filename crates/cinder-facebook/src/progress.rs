use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacebookProgress {
    /// UI language found before the run switched it
    pub user_lang: Option<String>,
    pub wall_posts_deleted: u64,
    /// Manage-posts dialog rounds completed
    pub delete_rounds: u64,
}
