// Common types and utilities shared across the application

pub mod error;
pub mod validation;
pub mod viewer;

pub use error::{BackendError, ServiceError, ServiceResult};
pub use validation::{FieldRule, FormValidation, PasswordStrength, ValidationErrors};
pub use viewer::require_user;
