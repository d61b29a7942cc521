//! Accounts and rows shared by the integration tests.

use gamesta_core::kernel::test_dependencies::{category_row, idea_row};
use gamesta_core::kernel::MockBackend;

pub const KNOWN_EMAIL: &str = "known@mitaoe.ac.in";
pub const KNOWN_PASSWORD: &str = "Fragm4ster!";
pub const KNOWN_USERNAME: &str = "fragmaster";

pub const OTHER_EMAIL: &str = "rival@mitaoe.ac.in";
pub const OTHER_PASSWORD: &str = "Sp33drun!";

pub const UNKNOWN_EMAIL: &str = "unknown@mitaoe.ac.in";

/// One verified player with a profile.
pub fn backend_with_known_user() -> MockBackend {
    MockBackend::new().with_user(KNOWN_EMAIL, KNOWN_PASSWORD, KNOWN_USERNAME)
}

/// Two players, two categories and an idea by the second player.
pub fn seeded_board() -> MockBackend {
    let backend = backend_with_known_user().with_user(OTHER_EMAIL, OTHER_PASSWORD, "speedrunner");
    let author = backend
        .user_id(OTHER_EMAIL)
        .expect("seeded account exists");
    backend
        .with_category(category_row("Tournaments"))
        .with_category(category_row("Esports"))
        .with_idea(idea_row(author, "Valorant campus cup"))
}
