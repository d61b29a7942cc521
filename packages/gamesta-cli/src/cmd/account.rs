//! Account commands: existence check, login, registration, profile

use anyhow::Result;
use colored::Colorize;
use gamesta_core::domains::auth::{
    self, AccountLookup, LoginOutcome, RegisterOutcome, SessionState, VerificationOutcome,
};
use gamesta_core::domains::profiles::ProfileUpdate;

use crate::cmd::report;
use crate::context::AppContext;

pub async fn check_user(ctx: &AppContext, email: &str) -> Result<()> {
    match auth::check_exists(ctx.deps(), email).await? {
        AccountLookup::Exists(profile) => {
            println!(
                "{} {} ({})",
                "✓".bright_green(),
                profile.email,
                profile.username.bright_cyan()
            );
        }
        AccountLookup::Missing => {
            println!("{} No account for {}", "✗".bright_red(), email);
        }
    }
    Ok(())
}

pub async fn login(ctx: &AppContext) -> Result<()> {
    ctx.print_header("Log in");
    let email = ctx.input("Email")?;
    let password = ctx.password("Password")?;

    match auth::login(&ctx.reconciler, &email, &password).await {
        Ok(LoginOutcome::Authenticated(state)) => print_state(ctx, &state),
        Ok(LoginOutcome::NoAccount) => {
            ctx.print_warning("No account found for that email.");
            ctx.print_info("Just confirmed your email? Choose \"I confirmed my email\".");
            if ctx.confirm("Register instead?", true)? {
                register(ctx).await?;
            }
        }
        Ok(LoginOutcome::Rejected { message }) => ctx.print_error(&message),
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

pub async fn register(ctx: &AppContext) -> Result<()> {
    ctx.print_header("Create an account");
    let email = ctx.input("Email")?;
    let username = ctx.input("Username")?;
    let password = ctx.password("Password")?;

    match auth::register(&ctx.reconciler, &email, &password, &username).await {
        Ok(RegisterOutcome::AlreadyRegistered) => {
            ctx.print_warning("That email is already registered.");
            ctx.print_info("Log in, or choose \"I confirmed my email\" if you just confirmed it.");
        }
        Ok(RegisterOutcome::VerificationPending { email }) => {
            ctx.print_success(&format!("Check {} for a confirmation link.", email));
            ctx.print_info("Then choose \"I confirmed my email\" from the menu.");
        }
        Ok(RegisterOutcome::SignedIn(state)) => print_state(ctx, &state),
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

pub async fn verify(ctx: &AppContext) -> Result<()> {
    ctx.print_header("Finish sign-up");
    let email = match ctx.reconciler.state() {
        SessionState::AwaitingVerification { email } => ctx.input_with_default("Email", &email)?,
        _ => ctx.input("Email")?,
    };
    let password = ctx.password("Password")?;

    match auth::complete_email_verification(&ctx.reconciler, &email, &password).await {
        Ok(VerificationOutcome::Verified(state)) => print_state(ctx, &state),
        Ok(VerificationOutcome::NotVerified) => {
            ctx.print_warning("Email not confirmed yet. Follow the link, then try again.");
        }
        Ok(VerificationOutcome::Rejected { message }) => ctx.print_error(&message),
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    match auth::logout(&ctx.reconciler).await {
        Ok(()) => ctx.print_success("Signed out."),
        Err(e) => {
            ctx.print_warning("Signed out locally; the server did not confirm.");
            report(ctx, &e);
        }
    }
    Ok(())
}

pub async fn edit_profile(ctx: &AppContext) -> Result<()> {
    let Some(profile) = ctx.reconciler.current_user() else {
        ctx.print_warning("Log in first.");
        return Ok(());
    };

    ctx.print_header(&format!("Profile: {}", profile.username));
    println!("  Email: {}", profile.email);
    println!("  Bio:   {}", profile.bio.as_deref().unwrap_or("-"));
    println!(
        "  Ideas: {}  Votes received: {}",
        profile.ideas_submitted, profile.total_votes_received
    );
    println!();

    let update = ProfileUpdate {
        username: ctx.optional_input("New username (blank to keep)")?,
        bio: ctx.optional_input("New bio (blank to keep)")?,
        avatar_url: None,
    };
    if update.is_empty() {
        return Ok(());
    }

    match ctx.reconciler.update_profile(update).await {
        Ok(updated) => ctx.print_success(&format!("Saved profile for {}.", updated.username)),
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

pub fn print_state(ctx: &AppContext, state: &SessionState) {
    match state {
        SessionState::Ready(profile) => {
            ctx.print_success(&format!("Welcome, {}!", profile.username));
        }
        SessionState::AwaitingVerification { email } => {
            ctx.print_warning(&format!("Confirm {} before logging in.", email));
        }
        SessionState::TimedOut { .. } => {
            ctx.print_warning("Signed in, but your profile took too long to load. Try again.");
        }
        SessionState::Failed { message, .. } => {
            ctx.print_error(&format!("Could not load your profile: {}", message));
        }
        SessionState::ProfileLoading { .. } => ctx.print_info("Loading your profile..."),
        SessionState::Anonymous => ctx.print_info("Not signed in."),
    }
}
