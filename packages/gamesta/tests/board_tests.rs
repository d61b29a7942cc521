//! Idea board operations: ideas, votes, comments, categories,
//! notifications and preferences.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use gamesta_core::common::ServiceError;
use gamesta_core::domains::categories::{self, NewCategory};
use gamesta_core::domains::comments;
use gamesta_core::domains::ideas::{self, IdeaQuery, IdeaSort, IdeaSubmission};
use gamesta_core::domains::notifications;
use gamesta_core::domains::preferences::{self, PreferencesUpdate};
use gamesta_core::domains::profiles::{self, Achievement, UserAchievement};
use gamesta_core::domains::votes::{self, VoteType};
use gamesta_core::kernel::test_dependencies::{idea_row, notification_row};
use uuid::Uuid;

fn first_idea_id(harness: &TestHarness) -> Uuid {
    harness.backend.ideas()[0].id
}

// =============================================================================
// Votes
// =============================================================================

#[tokio::test]
async fn voting_toggles() {
    let harness = TestHarness::new(seeded_board());
    let viewer = harness.viewer(KNOWN_EMAIL);
    let idea_id = first_idea_id(&harness);

    let cast = votes::cast_vote(&harness.deps, viewer, idea_id, VoteType::Upvote)
        .await
        .expect("vote cast");
    assert_eq!(cast.map(|v| v.vote_type), Some(VoteType::Upvote));
    assert_eq!(harness.backend.votes().len(), 1);

    let switched = votes::cast_vote(&harness.deps, viewer, idea_id, VoteType::Downvote)
        .await
        .expect("vote switched");
    assert_eq!(switched.map(|v| v.vote_type), Some(VoteType::Downvote));
    assert_eq!(harness.backend.votes().len(), 1);

    let withdrawn = votes::cast_vote(&harness.deps, viewer, idea_id, VoteType::Downvote)
        .await
        .expect("vote withdrawn");
    assert!(withdrawn.is_none());
    assert!(harness.backend.votes().is_empty());
}

#[tokio::test]
async fn voting_requires_sign_in() {
    let harness = TestHarness::new(seeded_board());
    let idea_id = first_idea_id(&harness);

    let result = votes::cast_vote(&harness.deps, None, idea_id, VoteType::Upvote).await;

    assert!(matches!(result, Err(ServiceError::NotAuthenticated)));
    assert!(harness.backend.calls().is_empty());
}

#[tokio::test]
async fn user_vote_is_none_for_anonymous_viewer() {
    let harness = TestHarness::new(seeded_board());
    let idea_id = first_idea_id(&harness);

    let vote = votes::get_user_vote(&harness.deps, None, idea_id)
        .await
        .expect("lookup runs");

    assert!(vote.is_none());
    assert!(harness.backend.calls().is_empty());
}

#[tokio::test]
async fn votes_for_idea_are_listed() {
    let harness = TestHarness::new(seeded_board());
    let idea_id = first_idea_id(&harness);
    for email in [KNOWN_EMAIL, OTHER_EMAIL] {
        votes::cast_vote(&harness.deps, harness.viewer(email), idea_id, VoteType::Upvote)
            .await
            .expect("vote cast");
    }

    let listed = votes::list_votes_for_idea(&harness.deps, idea_id)
        .await
        .expect("listing runs");
    let all = votes::list_all_votes(&harness.deps).await.expect("listing runs");

    assert_eq!(listed.len(), 2);
    assert_eq!(all.len(), 2);
}

// =============================================================================
// Ideas
// =============================================================================

#[tokio::test]
async fn listing_attaches_viewer_vote() {
    let harness = TestHarness::new(seeded_board());
    let viewer = harness.viewer(KNOWN_EMAIL);
    let idea_id = first_idea_id(&harness);
    votes::cast_vote(&harness.deps, viewer, idea_id, VoteType::Upvote)
        .await
        .expect("vote cast");

    let mine = ideas::list_ideas(&harness.deps, viewer, &IdeaQuery::default())
        .await
        .expect("listing runs");
    let anonymous = ideas::list_ideas(&harness.deps, None, &IdeaQuery::default())
        .await
        .expect("listing runs");

    assert_eq!(mine[0].user_vote, Some(VoteType::Upvote));
    assert_eq!(anonymous[0].user_vote, None);
}

#[tokio::test]
async fn default_listing_is_cached() {
    let harness = TestHarness::new(seeded_board());
    assert!(ideas::cached_ideas(&harness.deps).is_none());

    let listed = ideas::list_ideas(&harness.deps, None, &IdeaQuery::default())
        .await
        .expect("listing runs");

    assert_eq!(ideas::cached_ideas(&harness.deps), Some(listed));
}

#[tokio::test]
async fn listing_sorts_and_limits() {
    let author = Uuid::new_v4();
    let mut popular = idea_row(author, "Smash Bros ladder");
    popular.net_votes = 12;
    let mut middling = idea_row(author, "Chess blitz arena");
    middling.net_votes = 3;
    let harness = TestHarness::new(
        seeded_board().with_idea(popular).with_idea(middling),
    );

    let query = IdeaQuery {
        sort_by: IdeaSort::NetVotes,
        limit: 2,
        ..IdeaQuery::default()
    };
    let top = ideas::list_ideas(&harness.deps, None, &query)
        .await
        .expect("listing runs");

    let titles: Vec<&str> = top.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Smash Bros ladder", "Chess blitz arena"]);
}

#[tokio::test]
async fn submitting_validates_before_sending() {
    let harness = TestHarness::new(seeded_board());

    let result = ideas::submit_idea(
        &harness.deps,
        harness.viewer(KNOWN_EMAIL),
        IdeaSubmission {
            title: "GG".into(),
            description: "Too short".into(),
            category_id: None,
        },
    )
    .await;

    let Err(ServiceError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert!(errors.get("title").is_some());
    assert!(errors.get("description").is_some());
    assert!(!harness.backend.was_called("insert_idea"));
}

#[tokio::test]
async fn submitting_requires_sign_in() {
    let harness = TestHarness::new(seeded_board());

    let result = ideas::submit_idea(
        &harness.deps,
        None,
        IdeaSubmission {
            title: "Retro arcade corner".into(),
            description: "Cabinets with classic games in the main hall".into(),
            category_id: None,
        },
    )
    .await;

    assert!(matches!(result, Err(ServiceError::NotAuthenticated)));
    assert!(harness.backend.calls().is_empty());
}

#[tokio::test]
async fn submitted_idea_is_stored_sanitized() {
    let harness = TestHarness::new(seeded_board());
    let viewer = harness.viewer(KNOWN_EMAIL);
    let category = categories::list_categories(&harness.deps)
        .await
        .expect("categories listed")
        .into_iter()
        .find(|c| c.name == "Tournaments")
        .expect("seeded category");

    let idea = ideas::submit_idea(
        &harness.deps,
        viewer,
        IdeaSubmission {
            title: "  Retro   <i>arcade</i> corner ".into(),
            description: "Cabinets with classic games in the main hall".into(),
            category_id: Some(category.id),
        },
    )
    .await
    .expect("idea submitted");

    assert_eq!(idea.title, "Retro arcade corner");
    assert_eq!(idea.author_id, harness.user_id(KNOWN_EMAIL));
    assert_eq!(idea.category.map(|c| c.name).as_deref(), Some("Tournaments"));
    assert_eq!(harness.backend.ideas().len(), 2);
}

#[tokio::test]
async fn missing_idea_is_none() {
    let harness = TestHarness::new(seeded_board());

    let idea = ideas::get_idea(&harness.deps, None, Uuid::new_v4())
        .await
        .expect("lookup runs");

    assert!(idea.is_none());
}

#[tokio::test]
async fn deleting_requires_sign_in() {
    let harness = TestHarness::new(seeded_board());
    let idea_id = first_idea_id(&harness);

    let denied = ideas::delete_idea(&harness.deps, None, idea_id).await;
    assert!(matches!(denied, Err(ServiceError::NotAuthenticated)));

    ideas::delete_idea(&harness.deps, harness.viewer(OTHER_EMAIL), idea_id)
        .await
        .expect("delete runs");
    assert!(harness.backend.ideas().is_empty());
}

#[tokio::test]
async fn search_matches_text_and_records_history() {
    let harness = TestHarness::new(seeded_board());

    let found = ideas::search_ideas(&harness.deps, "valorant", &[])
        .await
        .expect("search runs");
    let none = ideas::search_ideas(&harness.deps, "minecraft", &[])
        .await
        .expect("search runs");

    assert_eq!(found.len(), 1);
    assert!(none.is_empty());
    assert_eq!(
        harness.deps.cache.search_history(),
        vec!["minecraft".to_string(), "valorant".to_string()]
    );
}

// =============================================================================
// Comments
// =============================================================================

#[tokio::test]
async fn comments_are_added_and_listed_in_order() {
    let harness = TestHarness::new(seeded_board());
    let idea_id = first_idea_id(&harness);

    let first = comments::add_comment(
        &harness.deps,
        harness.viewer(KNOWN_EMAIL),
        idea_id,
        "Count me in!",
        None,
    )
    .await
    .expect("comment added");
    comments::add_comment(
        &harness.deps,
        harness.viewer(OTHER_EMAIL),
        idea_id,
        "Great, see you there",
        Some(first.id),
    )
    .await
    .expect("reply added");

    let listed = comments::list_comments(&harness.deps, idea_id)
        .await
        .expect("listing runs");

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].content, "Count me in!");
    assert_eq!(
        listed[0].author.as_ref().map(|a| a.username.as_str()),
        Some(KNOWN_USERNAME)
    );
    assert_eq!(listed[1].parent_id, Some(first.id));
}

#[tokio::test]
async fn commenting_requires_sign_in_and_content() {
    let harness = TestHarness::new(seeded_board());
    let idea_id = first_idea_id(&harness);

    let anonymous = comments::add_comment(&harness.deps, None, idea_id, "hello", None).await;
    assert!(matches!(anonymous, Err(ServiceError::NotAuthenticated)));

    let empty = comments::add_comment(
        &harness.deps,
        harness.viewer(KNOWN_EMAIL),
        idea_id,
        "   ",
        None,
    )
    .await;
    assert!(matches!(empty, Err(ServiceError::Validation(_))));
    assert!(!harness.backend.was_called("insert_comment"));
}

// =============================================================================
// Categories, notifications, preferences, profiles
// =============================================================================

#[tokio::test]
async fn categories_are_listed_by_name() {
    let harness = TestHarness::new(seeded_board());

    let listed = categories::list_categories(&harness.deps)
        .await
        .expect("listing runs");

    let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Esports", "Tournaments"]);
}

#[tokio::test]
async fn creating_category_needs_user_and_defaults_color() {
    let harness = TestHarness::new(seeded_board());
    let new = || NewCategory {
        name: "Board games".into(),
        description: "Tabletop nights".into(),
        color: String::new(),
    };

    let denied = categories::create_category(&harness.deps, None, new()).await;
    assert!(matches!(denied, Err(ServiceError::NotAuthenticated)));

    let created = categories::create_category(&harness.deps, harness.viewer(KNOWN_EMAIL), new())
        .await
        .expect("category created");
    assert_eq!(created.color.as_deref(), Some("#6366f1"));
}

#[tokio::test]
async fn notifications_are_newest_first_and_marked_read() {
    let backend = backend_with_known_user();
    let user_id = backend.user_id(KNOWN_EMAIL).expect("seeded account");
    let harness = TestHarness::new(
        backend
            .with_notification(notification_row(user_id, "Older", 30))
            .with_notification(notification_row(user_id, "Newest", 1))
            .with_notification(notification_row(Uuid::new_v4(), "Someone else's", 0)),
    );

    let listed = notifications::list_notifications(&harness.deps, Some(user_id), 20)
        .await
        .expect("listing runs");
    let titles: Vec<&str> = listed.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Newest", "Older"]);

    notifications::mark_notification_read(&harness.deps, Some(user_id), listed[0].id)
        .await
        .expect("marked read");
    let again = notifications::list_notifications(&harness.deps, Some(user_id), 1)
        .await
        .expect("listing runs");
    assert_eq!(again.len(), 1);
    assert!(again[0].read);
}

#[tokio::test]
async fn notifications_require_sign_in() {
    let harness = TestHarness::new(backend_with_known_user());

    let result = notifications::list_notifications(&harness.deps, None, 20).await;

    assert!(matches!(result, Err(ServiceError::NotAuthenticated)));
    assert!(harness.backend.calls().is_empty());
}

#[tokio::test]
async fn new_profile_gets_default_preferences() {
    let harness = TestHarness::new(gamesta_core::kernel::MockBackend::new());
    let user_id = Uuid::new_v4();

    profiles::create_profile(&harness.deps, user_id, "lan@mitaoe.ac.in", "lan_party")
        .await
        .expect("profile created");
    let prefs = preferences::get_preferences(&harness.deps, Some(user_id))
        .await
        .expect("lookup runs")
        .expect("defaults exist");
    assert!(prefs.email_notifications);
    assert!(!prefs.dark_mode);

    let updated = preferences::update_preferences(
        &harness.deps,
        Some(user_id),
        PreferencesUpdate {
            dark_mode: Some(true),
            ..Default::default()
        },
    )
    .await
    .expect("update runs");
    assert!(updated.dark_mode);

    let users = profiles::list_all_users(&harness.deps).await.expect("listing runs");
    assert_eq!(users.len(), 1);
    assert!(profiles::get_profile(&harness.deps, Uuid::new_v4())
        .await
        .expect("lookup runs")
        .is_none());
}

#[tokio::test]
async fn achievements_are_listed_newest_first_for_one_user() {
    let backend = backend_with_known_user().with_account(OTHER_EMAIL, OTHER_PASSWORD, true);
    let known = backend.user_id(KNOWN_EMAIL).expect("known account");
    let other = backend.user_id(OTHER_EMAIL).expect("other account");
    let earned = |user_id: Uuid, name: &str, days_ago: i64| {
        let achievement = Achievement {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: format!("Earned {}", name),
            icon: None,
            color: None,
            criteria: serde_json::json!({}),
            created_at: Utc::now() - ChronoDuration::days(30),
        };
        UserAchievement {
            id: Uuid::new_v4(),
            user_id,
            achievement_id: achievement.id,
            earned_at: Utc::now() - ChronoDuration::days(days_ago),
            achievement: Some(achievement),
        }
    };
    let harness = TestHarness::new(
        backend
            .with_achievement(earned(known, "First Idea", 5))
            .with_achievement(earned(known, "Crowd Favourite", 1))
            .with_achievement(earned(other, "Early Bird", 2)),
    );

    let mine = profiles::list_user_achievements(&harness.deps, known)
        .await
        .expect("listing runs");

    let names: Vec<_> = mine
        .iter()
        .filter_map(|a| a.achievement.as_ref().map(|d| d.name.as_str()))
        .collect();
    assert_eq!(names, vec!["Crowd Favourite", "First Idea"]);
    assert!(mine.iter().all(|a| a.user_id == known));
}
