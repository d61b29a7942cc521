use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated account as reported by the auth API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account has completed email verification.
    pub fn is_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    /// Look up a string field from the sign-up metadata.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Token bundle returned by a successful sign-in or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// True once the access token is past its expiry (with a small skew).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now.timestamp() + 10 >= expires_at,
            None => false,
        }
    }
}

/// Outcome of `auth/v1/signup`.
///
/// With email confirmation enabled the backend returns only the user; with
/// auto-confirm it returns a full session.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

/// Extra options for sign-up.
#[derive(Debug, Clone, Default)]
pub struct SignUpOptions {
    /// Stored as `user_metadata` on the account.
    pub data: serde_json::Value,
    /// Where the verification email link should land.
    pub email_redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub data: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}
