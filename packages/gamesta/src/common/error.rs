//! Error types shared by every backend-facing operation.
//!
//! Every call outcome is one of: success, not found, backend error,
//! validation error, or timeout. `BackendError::NoRows` is kept separate so
//! "does not exist" is never confused with "could not ask".

use std::time::Duration;
use thiserror::Error;

use super::validation::ValidationErrors;

/// Failure reported by (or while talking to) the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// A single-row read matched nothing (`PGRST116`).
    #[error("no matching rows")]
    NoRows,

    /// The backend answered with an error. `message` is shown to users verbatim.
    #[error("{message}")]
    Service {
        code: Option<String>,
        message: String,
    },

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),
}

impl BackendError {
    pub fn service(message: impl Into<String>) -> Self {
        BackendError::Service {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_no_rows(&self) -> bool {
        matches!(self, BackendError::NoRows)
    }
}

impl From<supabase::SupabaseError> for BackendError {
    fn from(err: supabase::SupabaseError) -> Self {
        use supabase::SupabaseError;

        if err.is_no_rows() {
            return BackendError::NoRows;
        }
        match err {
            SupabaseError::Network(e) => BackendError::Network(e.to_string()),
            SupabaseError::Api { code, message, .. } => BackendError::Service { code, message },
            SupabaseError::Config(message) => BackendError::Service {
                code: None,
                message,
            },
            SupabaseError::Parse(e) => BackendError::Service {
                code: None,
                message: format!("unexpected response: {}", e),
            },
        }
    }
}

/// Error returned by application operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before any network call.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("you must be signed in to do that")]
    NotAuthenticated,
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
