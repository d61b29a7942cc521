//! Login, registration, verification and logout flows.

mod common;

use common::*;
use gamesta_core::common::{BackendError, ServiceError};
use gamesta_core::domains::auth::{
    self, AccountLookup, LoginOutcome, RegisterOutcome, SessionState, VerificationOutcome,
};
use gamesta_core::kernel::test_dependencies::profile_row;
use gamesta_core::kernel::MockBackend;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// Existence check
// =============================================================================

#[tokio::test]
async fn check_exists_finds_known_account() {
    let harness = TestHarness::new(backend_with_known_user());

    let lookup = auth::check_exists(&harness.deps, "  Known@MITAOE.ac.in ")
        .await
        .expect("lookup succeeds");

    let AccountLookup::Exists(profile) = lookup else {
        panic!("expected account to exist");
    };
    assert_eq!(profile.username, KNOWN_USERNAME);
}

#[tokio::test]
async fn check_exists_reports_missing_account() {
    let harness = TestHarness::new(backend_with_known_user());

    let lookup = auth::check_exists(&harness.deps, UNKNOWN_EMAIL)
        .await
        .expect("lookup succeeds");

    assert_eq!(lookup, AccountLookup::Missing);
}

#[tokio::test]
async fn check_exists_outage_is_indeterminate() {
    let harness = TestHarness::new(backend_with_known_user());
    harness.backend.set_outage(Some(BackendError::service("upstream connect error")));

    let result = auth::check_exists(&harness.deps, UNKNOWN_EMAIL).await;

    match result {
        Err(ServiceError::Backend(BackendError::Service { message, .. })) => {
            assert_eq!(message, "upstream connect error");
        }
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn check_exists_rejects_bad_email_without_network() {
    let harness = TestHarness::new(backend_with_known_user());

    let result = auth::check_exists(&harness.deps, "not-an-email").await;

    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert!(harness.backend.calls().is_empty());
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn login_succeeds_and_loads_profile() {
    let harness = TestHarness::new(backend_with_known_user());

    let outcome = auth::login(&harness.reconciler, KNOWN_EMAIL, KNOWN_PASSWORD)
        .await
        .expect("login runs");

    let LoginOutcome::Authenticated(SessionState::Ready(profile)) = outcome else {
        panic!("expected ready session, got {:?}", outcome);
    };
    assert_eq!(profile.username, KNOWN_USERNAME);
    assert_eq!(
        harness.reconciler.current_user_id(),
        Some(harness.user_id(KNOWN_EMAIL))
    );
    assert_eq!(
        harness.backend.calls(),
        vec!["profile_by_email", "sign_in_with_password", "profile_by_id"]
    );
}

#[tokio::test]
async fn login_for_missing_account_never_checks_credentials() {
    let harness = TestHarness::new(backend_with_known_user());

    let outcome = auth::login(&harness.reconciler, UNKNOWN_EMAIL, "Wh4tever!")
        .await
        .expect("login runs");

    assert_eq!(outcome, LoginOutcome::NoAccount);
    assert!(!harness.backend.was_called("sign_in_with_password"));
    assert!(harness.reconciler.current_user().is_none());
}

#[tokio::test]
async fn login_with_wrong_password_surfaces_backend_message() {
    let harness = TestHarness::new(backend_with_known_user());

    let outcome = auth::login(&harness.reconciler, KNOWN_EMAIL, "wrong-password")
        .await
        .expect("login runs");

    assert_eq!(
        outcome,
        LoginOutcome::Rejected {
            message: "Invalid login credentials".into()
        }
    );
    assert!(harness.reconciler.current_user().is_none());
}

#[tokio::test]
async fn login_for_unconfirmed_account_is_rejected() {
    let backend = MockBackend::new().with_account("pending@mitaoe.ac.in", "P3nding!", false);
    let id = backend.user_id("pending@mitaoe.ac.in").expect("account");
    let harness = TestHarness::new(
        backend.with_profile(profile_row(id, "pending@mitaoe.ac.in", "pending_player")),
    );

    let outcome = auth::login(&harness.reconciler, "pending@mitaoe.ac.in", "P3nding!")
        .await
        .expect("login runs");

    assert_eq!(
        outcome,
        LoginOutcome::Rejected {
            message: "Email not confirmed".into()
        }
    );
}

#[tokio::test]
async fn login_validation_happens_before_any_call() {
    let harness = TestHarness::new(backend_with_known_user());

    let result = auth::login(&harness.reconciler, "", "").await;

    let Err(ServiceError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert_eq!(errors.get("email"), Some("Email is required"));
    assert_eq!(errors.get("password"), Some("Password is required"));
    assert!(harness.backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_sign_in_times_out() {
    let harness = TestHarness::new(
        backend_with_known_user().with_sign_in_delay(Duration::from_secs(60)),
    );

    let result = auth::login(&harness.reconciler, KNOWN_EMAIL, KNOWN_PASSWORD).await;

    match result {
        Err(ServiceError::Timeout { operation, after }) => {
            assert_eq!(operation, "sign-in");
            assert_eq!(after, Duration::from_secs(15));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(harness.reconciler.current_user().is_none());
}

#[tokio::test]
async fn repeated_failed_logins_are_throttled() {
    let harness = TestHarness::new(backend_with_known_user());

    for _ in 0..5 {
        let outcome = auth::login(&harness.reconciler, KNOWN_EMAIL, "wrong-password")
            .await
            .expect("login runs");
        assert!(matches!(outcome, LoginOutcome::Rejected { .. }));
    }

    let result = auth::login(&harness.reconciler, KNOWN_EMAIL, KNOWN_PASSWORD).await;
    let Err(ServiceError::Validation(errors)) = result else {
        panic!("expected throttling");
    };
    assert!(errors
        .get("email")
        .is_some_and(|m| m.starts_with("Too many login attempts")));
    assert_eq!(harness.backend.call_count("sign_in_with_password"), 5);
}

// =============================================================================
// Registration and verification
// =============================================================================

#[tokio::test]
async fn registration_waits_for_email_confirmation() {
    let harness = TestHarness::new(MockBackend::new());

    let outcome = auth::register(
        &harness.reconciler,
        "Newbie@MITAOE.ac.in",
        "N3wbie!pass",
        "rocket_rookie",
    )
    .await
    .expect("register runs");

    assert_eq!(
        outcome,
        RegisterOutcome::VerificationPending {
            email: "newbie@mitaoe.ac.in".into()
        }
    );
    assert_eq!(
        harness.reconciler.state(),
        SessionState::AwaitingVerification {
            email: "newbie@mitaoe.ac.in".into()
        }
    );
    assert!(harness.backend.profiles().is_empty());
}

#[tokio::test]
async fn confirmed_registration_creates_profile_from_signup_username() {
    let harness = TestHarness::new(MockBackend::new());
    auth::register(
        &harness.reconciler,
        "newbie@mitaoe.ac.in",
        "N3wbie!pass",
        "rocket_rookie",
    )
    .await
    .expect("register runs");

    let before = auth::complete_email_verification(
        &harness.reconciler,
        "newbie@mitaoe.ac.in",
        "N3wbie!pass",
    )
    .await
    .expect("verification check runs");
    assert_eq!(before, VerificationOutcome::NotVerified);

    harness.backend.confirm_email("newbie@mitaoe.ac.in");
    let after = auth::complete_email_verification(
        &harness.reconciler,
        "newbie@mitaoe.ac.in",
        "N3wbie!pass",
    )
    .await
    .expect("verification check runs");

    let VerificationOutcome::Verified(SessionState::Ready(profile)) = after else {
        panic!("expected verified ready session, got {:?}", after);
    };
    assert_eq!(profile.username, "rocket_rookie");
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://api.dicebear.com/7.x/avataaars/svg?seed=rocket_rookie")
    );
    assert_eq!(harness.backend.preferences_rows().len(), 1);
}

#[tokio::test]
async fn auto_confirmed_registration_signs_in() {
    let harness = TestHarness::new(MockBackend::new().with_auto_confirm());

    let outcome = auth::register(
        &harness.reconciler,
        "instant@mitaoe.ac.in",
        "Inst4nt!pass",
        "instant_gamer",
    )
    .await
    .expect("register runs");

    let RegisterOutcome::SignedIn(SessionState::Ready(profile)) = outcome else {
        panic!("expected signed in, got {:?}", outcome);
    };
    assert_eq!(profile.username, "instant_gamer");
    assert_eq!(harness.backend.profiles().len(), 1);
}

#[tokio::test]
async fn registration_for_existing_account_is_friendly() {
    let harness = TestHarness::new(backend_with_known_user());

    let outcome = auth::register(&harness.reconciler, KNOWN_EMAIL, "An0ther!pass", "someone_new")
        .await
        .expect("register runs");

    assert_eq!(outcome, RegisterOutcome::AlreadyRegistered);
    assert!(!harness.backend.was_called("sign_up"));
}

#[tokio::test]
async fn registration_rejects_reserved_username_and_weak_password() {
    let harness = TestHarness::new(MockBackend::new());

    let result = auth::register(&harness.reconciler, "x@mitaoe.ac.in", "password", "admin").await;

    let Err(ServiceError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert_eq!(errors.get("username"), Some("This username is reserved"));
    assert_eq!(errors.get("password"), Some("Please choose a stronger password"));
    assert!(harness.backend.calls().is_empty());
}

#[tokio::test]
async fn verification_with_wrong_credentials_is_rejected() {
    let harness = TestHarness::new(MockBackend::new());

    let outcome = auth::complete_email_verification(
        &harness.reconciler,
        UNKNOWN_EMAIL,
        "Wh4tever!",
    )
    .await
    .expect("verification check runs");

    assert_eq!(
        outcome,
        VerificationOutcome::Rejected {
            message: "Invalid login credentials".into()
        }
    );
    assert!(harness.reconciler.current_user().is_none());
}

#[tokio::test]
async fn account_confirmed_in_browser_can_finish_sign_up() {
    let harness = TestHarness::new(MockBackend::new().with_account(
        "newbie@mitaoe.ac.in",
        "N3wbie!pass",
        true,
    ));

    let login = auth::login(&harness.reconciler, "newbie@mitaoe.ac.in", "N3wbie!pass")
        .await
        .expect("login runs");
    assert_eq!(login, LoginOutcome::NoAccount);

    let again = auth::register(
        &harness.reconciler,
        "newbie@mitaoe.ac.in",
        "N3wbie!pass",
        "rocket_rookie",
    )
    .await
    .expect("register runs");
    assert_eq!(again, RegisterOutcome::AlreadyRegistered);

    let outcome = auth::complete_email_verification(
        &harness.reconciler,
        "newbie@mitaoe.ac.in",
        "N3wbie!pass",
    )
    .await
    .expect("verification runs");

    let VerificationOutcome::Verified(SessionState::Ready(profile)) = outcome else {
        panic!("expected ready session, got {:?}", outcome);
    };
    assert_eq!(profile.email, "newbie@mitaoe.ac.in");
    assert_eq!(harness.backend.profiles().len(), 1);
    // Only login and register looked up the profile by email.
    assert_eq!(harness.backend.call_count("profile_by_email"), 2);

    let login = auth::login(&harness.reconciler, "newbie@mitaoe.ac.in", "N3wbie!pass")
        .await
        .expect("login runs");
    assert!(matches!(login, LoginOutcome::Authenticated(SessionState::Ready(_))));
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn logout_clears_session_and_marker() {
    let harness = TestHarness::new(backend_with_known_user());
    auth::login(&harness.reconciler, KNOWN_EMAIL, KNOWN_PASSWORD)
        .await
        .expect("login runs");
    assert!(harness.reconciler.session_marker().is_some());

    assert_ok!(auth::logout(&harness.reconciler).await);

    assert_eq!(harness.reconciler.state(), SessionState::Anonymous);
    assert!(harness.reconciler.session_marker().is_none());
    assert!(!harness.backend.has_session());
}

#[tokio::test]
async fn logout_clears_locally_even_when_backend_fails() {
    let harness = TestHarness::new(
        backend_with_known_user()
            .with_sign_out_error(BackendError::Network("connection refused".into())),
    );
    auth::login(&harness.reconciler, KNOWN_EMAIL, KNOWN_PASSWORD)
        .await
        .expect("login runs");

    let error = assert_err!(auth::logout(&harness.reconciler).await);

    assert!(matches!(error, ServiceError::Backend(BackendError::Network(_))));
    assert_eq!(harness.reconciler.state(), SessionState::Anonymous);
    assert!(harness.reconciler.current_user().is_none());
    assert!(harness.reconciler.session_marker().is_none());
}
