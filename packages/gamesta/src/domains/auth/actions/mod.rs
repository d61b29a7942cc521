mod check_exists;
mod login;
mod logout;
mod register;
mod verify_email;

pub use check_exists::{check_exists, AccountLookup};
pub use login::{login, LoginOutcome};
pub use logout::logout;
pub use register::{register, RegisterOutcome};
pub use verify_email::{complete_email_verification, VerificationOutcome};
