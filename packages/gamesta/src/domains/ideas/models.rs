use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domains::categories::models::Category;
use crate::domains::profiles::models::AuthorSummary;
use crate::domains::votes::models::VoteType;

/// Review state of an idea. Values the client does not know map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    Submitted,
    UnderReview,
    Approved,
    InProgress,
    Implemented,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdeaStatus::Submitted => write!(f, "submitted"),
            IdeaStatus::UnderReview => write!(f, "under_review"),
            IdeaStatus::Approved => write!(f, "approved"),
            IdeaStatus::InProgress => write!(f, "in_progress"),
            IdeaStatus::Implemented => write!(f, "implemented"),
            IdeaStatus::Rejected => write!(f, "rejected"),
            IdeaStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Row of the `ideas` table with its joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub net_votes: i64,
    pub author_id: Uuid,
    pub status: IdeaStatus,
    #[serde(default)]
    pub featured: bool,
    pub implementation_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
    #[serde(default)]
    pub category: Option<Category>,
    /// The signed-in viewer's vote, attached client-side.
    #[serde(default)]
    pub user_vote: Option<VoteType>,
    #[serde(default)]
    pub comments_count: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdeaSort {
    #[default]
    CreatedAt,
    NetVotes,
    Upvotes,
}

impl IdeaSort {
    pub fn column(&self) -> &'static str {
        match self {
            IdeaSort::CreatedAt => "created_at",
            IdeaSort::NetVotes => "net_votes",
            IdeaSort::Upvotes => "upvotes",
        }
    }
}

impl std::str::FromStr for IdeaSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" | "newest" => Ok(IdeaSort::CreatedAt),
            "net_votes" | "top" => Ok(IdeaSort::NetVotes),
            "upvotes" => Ok(IdeaSort::Upvotes),
            other => Err(format!("unknown sort '{}'", other)),
        }
    }
}

/// Filters for listing ideas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaQuery {
    pub category_id: Option<Uuid>,
    pub status: IdeaStatus,
    pub featured: Option<bool>,
    pub limit: usize,
    pub offset: usize,
    pub sort_by: IdeaSort,
    pub ascending: bool,
}

impl Default for IdeaQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            status: IdeaStatus::Submitted,
            featured: None,
            limit: 50,
            offset: 0,
            sort_by: IdeaSort::CreatedAt,
            ascending: false,
        }
    }
}

/// Insert payload. The author is always the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub author_id: Uuid,
}

/// Partial update. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdeaUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IdeaStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}
