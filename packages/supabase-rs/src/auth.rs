//! GoTrue auth endpoints.

use reqwest::Method;

use crate::types::{PasswordGrant, RefreshGrant, SignUpBody};
use crate::{check, Result, Session, SignUpOptions, SignUpResponse, SupabaseClient, SupabaseError, User};

/// Borrowed view over the auth API of a [`SupabaseClient`].
pub struct AuthApi<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Register a new account. Depending on project settings the response
    /// carries a session (auto-confirm) or only the unconfirmed user.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        options: &SignUpOptions,
    ) -> Result<SignUpResponse> {
        let url = self.client.auth_url("signup");
        let mut req = self
            .client
            .request(Method::POST, &url)
            .json(&SignUpBody {
                email,
                password,
                data: &options.data,
            });
        if let Some(redirect) = &options.email_redirect_to {
            req = req.query(&[("redirect_to", redirect.as_str())]);
        }

        let resp = check(req.send().await?).await?;
        let body: serde_json::Value = resp.json().await?;
        parse_sign_up(body)
    }

    /// Exchange email + password for a session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.client.auth_url("token");
        let resp = self
            .client
            .request(Method::POST, &url)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let session: Session = check(resp).await?.json().await?;
        tracing::debug!(user_id = %session.user.id, "Password grant succeeded");
        Ok(session)
    }

    /// Exchange a refresh token for a fresh session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let url = self.client.auth_url("token");
        let resp = self
            .client
            .request(Method::POST, &url)
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;

        Ok(check(resp).await?.json().await?)
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = self.client.auth_url("logout");
        let resp = self
            .client
            .request_as(Method::POST, &url, access_token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Fetch the account behind `access_token`.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        let url = self.client.auth_url("user");
        let resp = self
            .client
            .request_as(Method::GET, &url, access_token)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

/// The signup endpoint answers with one of three shapes: a session, a bare
/// user, or `{ user, session }`.
fn parse_sign_up(body: serde_json::Value) -> Result<SignUpResponse> {
    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body)?;
        return Ok(SignUpResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    if let Some(user) = body.get("user") {
        let user: Option<User> = serde_json::from_value(user.clone())?;
        let session: Option<Session> = match body.get("session") {
            Some(s) if !s.is_null() => Some(serde_json::from_value(s.clone())?),
            _ => None,
        };
        return Ok(SignUpResponse { user, session });
    }

    if body.get("id").is_some() {
        let user: User = serde_json::from_value(body)?;
        return Ok(SignUpResponse {
            user: Some(user),
            session: None,
        });
    }

    Err(SupabaseError::Api {
        status: 200,
        code: None,
        message: "Signup response contained neither a user nor a session".into(),
    })
}
