use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public part of a user profile, joined onto complaints for admins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ProfileSummary {
    /// Best available display name
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}
