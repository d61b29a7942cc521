use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub ideas_submitted: i64,
    #[serde(default)]
    pub total_votes_received: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author fields embedded in ideas and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Insert payload for a new profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
}

impl NewProfile {
    /// Profile with the generated avatar for `username`.
    pub fn new(id: Uuid, email: &str, username: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            username: username.to_string(),
            avatar_url: default_avatar_url(username),
        }
    }
}

/// Partial update of a profile. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub criteria: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub earned_at: DateTime<Utc>,
    #[serde(default)]
    pub achievement: Option<Achievement>,
}

pub fn default_avatar_url(username: &str) -> String {
    format!("{}?seed={}", AVATAR_BASE_URL, username)
}
