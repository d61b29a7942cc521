//! Error types for the Supabase client.

use serde::Deserialize;
use thiserror::Error;

/// PostgREST code returned when a single-row read matches zero rows.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Result type for Supabase client operations.
pub type Result<T> = std::result::Result<T, SupabaseError>;

/// Supabase client errors.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Configuration error (missing URL or key, malformed settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, TLS, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the auth or table API
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SupabaseError {
    /// Machine-readable error code reported by the backend, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            SupabaseError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True when a single-row read found nothing.
    pub fn is_no_rows(&self) -> bool {
        self.code() == Some(NO_ROWS_CODE)
    }

    /// Build an `Api` error from a status code and raw response body.
    ///
    /// PostgREST and GoTrue use different error envelopes; both are folded
    /// into `code` + `message`. Unparseable bodies are kept verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => {
                let message = parsed
                    .message
                    .or(parsed.error_description)
                    .or(parsed.msg)
                    .or_else(|| parsed.error.clone())
                    .unwrap_or_else(|| body.to_string());
                let code = parsed.code.map(code_to_string).or(parsed.error_code);
                SupabaseError::Api {
                    status,
                    code,
                    message,
                }
            }
            Err(_) => SupabaseError::Api {
                status,
                code: None,
                message: body.to_string(),
            },
        }
    }
}

/// Union of the PostgREST and GoTrue error envelopes.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

// GoTrue sends numeric HTTP codes in `code`, PostgREST sends strings.
fn code_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_no_rows_is_detected() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        let err = SupabaseError::from_response(406, body);

        assert!(err.is_no_rows());
        assert_eq!(
            err.to_string(),
            "API error (406): JSON object requested, multiple (or no) rows returned"
        );
    }

    #[test]
    fn test_gotrue_error_message_is_kept_verbatim() {
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        let err = SupabaseError::from_response(400, body);

        assert!(!err.is_no_rows());
        assert_eq!(err.code(), Some("400"));
        match err {
            SupabaseError::Api { message, .. } => assert_eq!(message, "Invalid login credentials"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_oauth_style_error_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#;
        let err = SupabaseError::from_response(400, body);

        match err {
            SupabaseError::Api { message, code, .. } => {
                assert_eq!(message, "Email not confirmed");
                assert_eq!(code, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_body_is_not_lost() {
        let err = SupabaseError::from_response(502, "Bad Gateway");
        match err {
            SupabaseError::Api { status, message, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
