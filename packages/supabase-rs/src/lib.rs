//! Pure Supabase REST client.
//!
//! A minimal client for the two Supabase surfaces an application needs from
//! the browser side: the GoTrue auth API (`/auth/v1`) and PostgREST table
//! access (`/rest/v1`). No realtime, storage or edge-function support.
//!
//! # Example
//!
//! ```rust,ignore
//! use supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new("https://xyz.supabase.co", "anon-key")?;
//!
//! let session = client
//!     .auth()
//!     .sign_in_with_password("player@example.com", "hunter22")
//!     .await?;
//! client.set_access_token(Some(session.access_token.clone()));
//!
//! let ideas: Vec<serde_json::Value> = client
//!     .from("ideas")
//!     .select("*")
//!     .eq("status", "submitted")
//!     .order("created_at", false)
//!     .range(0, 49)
//!     .execute()
//!     .await?;
//! ```

pub mod auth;
pub mod error;
pub mod query;
pub mod types;

pub use auth::AuthApi;
pub use error::{Result, SupabaseError, NO_ROWS_CODE};
pub use query::QueryBuilder;
pub use types::{Session, SignUpOptions, SignUpResponse, User};

use std::sync::{Arc, RwLock};

/// Shared handle to a Supabase project.
///
/// Cheap to clone; clones share the current access token so that table
/// requests made after sign-in run under the user's row-level-security role.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let anon_key = anon_key.into();

        if base_url.is_empty() {
            return Err(SupabaseError::Config("project URL is empty".into()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SupabaseError::Config(format!(
                "project URL must be http(s): {}",
                base_url
            )));
        }
        if anon_key.is_empty() {
            return Err(SupabaseError::Config("anon key is empty".into()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            anon_key,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set (or clear) the user access token sent with table requests.
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = match self.access_token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token;
    }

    pub fn access_token(&self) -> Option<String> {
        match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Auth API (`/auth/v1`).
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Start a PostgREST query against `table`.
    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.clone(), table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Base request with the project key and the best available bearer.
    pub(crate) fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Request authenticated with an explicit user token.
    pub(crate) fn request_as(
        &self,
        method: reqwest::Method,
        url: &str,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }
}

/// Turn a non-2xx response into `SupabaseError::Api`.
pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), body = %body, "Supabase request failed");
    Err(SupabaseError::from_response(status.as_u16(), &body))
}
