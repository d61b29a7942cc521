pub mod account;
pub mod doctor;
pub mod ideas;

use gamesta_core::common::ServiceError;

use crate::context::AppContext;

/// Print a failed operation the way the user needs to see it.
///
/// Validation errors are listed per field; everything else is one line.
pub fn report(ctx: &AppContext, error: &ServiceError) {
    match error {
        ServiceError::Validation(errors) => {
            for (field, message) in &errors.0 {
                ctx.print_error(&format!("  {}: {}", field, message));
            }
        }
        ServiceError::NotAuthenticated => ctx.print_warning("Log in first."),
        other => ctx.print_error(&other.to_string()),
    }
}
