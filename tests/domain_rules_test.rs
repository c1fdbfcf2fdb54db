//! Integration tests for the pure platform rules, exercised through the
//! public crate API.

use community_hub::domain::{
    has_capacity, threshold_reached, Activity, MemberRole, ModerationAction, Password, PointTotals,
    ReportStatus, ReputationLevel, ReputationSummary,
};

// =============================================================================
// Reputation levels
// =============================================================================

#[test]
fn test_level_boundaries() {
    let cases = [
        (-10, ReputationLevel::Newcomer),
        (0, ReputationLevel::Newcomer),
        (24, ReputationLevel::Newcomer),
        (25, ReputationLevel::Beginner),
        (99, ReputationLevel::Beginner),
        (100, ReputationLevel::Intermediate),
        (499, ReputationLevel::Intermediate),
        (500, ReputationLevel::Advanced),
        (999, ReputationLevel::Advanced),
        (1000, ReputationLevel::Expert),
        (1_000_000, ReputationLevel::Expert),
    ];
    for (points, expected) in cases {
        assert_eq!(ReputationLevel::from_points(points), expected, "{points} points");
    }
}

#[test]
fn test_level_is_monotonic() {
    let mut previous = ReputationLevel::from_points(-1);
    for points in 0..=1200 {
        let level = ReputationLevel::from_points(points);
        assert!(level >= previous, "level dropped at {points}");
        previous = level;
    }
}

#[test]
fn test_summary_uses_earned_points_not_balance() {
    // 120 earned, 100 spent on a badge
    let summary = ReputationSummary::from(PointTotals {
        balance: 20,
        earned: 120,
    });
    assert_eq!(summary.level, ReputationLevel::Intermediate);
    assert_eq!(summary.balance, 20);
    assert_eq!(summary.next_level, Some(ReputationLevel::Advanced));
    assert_eq!(summary.points_to_next_level, Some(380));
}

#[test]
fn test_expert_has_no_next_level() {
    let summary = ReputationSummary::from(PointTotals {
        balance: 1500,
        earned: 1500,
    });
    assert_eq!(summary.next_level, None);
    assert_eq!(summary.points_to_next_level, None);
}

#[test]
fn test_activity_awards() {
    assert_eq!(Activity::CreateCommunity.points(), 50);
    assert_eq!(Activity::JoinCommunity.points(), 10);
    assert_eq!(Activity::CreatePost.points(), 5);
    assert_eq!(Activity::CreateEvent.points(), 20);
    assert_eq!(Activity::RsvpGoing.points(), 5);
    assert_eq!(Activity::ReportUpheld.points(), 15);
}

// =============================================================================
// Report threshold
// =============================================================================

#[test]
fn test_threshold_at_thirty_percent() {
    assert!(threshold_reached(3, 10));
    assert!(!threshold_reached(2, 10));
    assert!(threshold_reached(1, 3));
    // 29/100 is strictly below
    assert!(!threshold_reached(29, 100));
    assert!(threshold_reached(30, 100));
}

#[test]
fn test_threshold_edge_cases() {
    assert!(!threshold_reached(0, 0));
    assert!(!threshold_reached(0, 10));
    assert!(threshold_reached(1, 0));
}

#[test]
fn test_report_lifecycle() {
    assert!(ReportStatus::Pending.is_open());
    assert!(ReportStatus::UnderReview.is_open());
    assert!(!ReportStatus::Actioned.is_open());
    assert!(!ReportStatus::Dismissed.is_open());

    assert_eq!(ModerationAction::Ban.resulting_status(), ReportStatus::Actioned);
    assert_eq!(ModerationAction::Delete.resulting_status(), ReportStatus::Actioned);
    assert_eq!(ModerationAction::Dismiss.resulting_status(), ReportStatus::Dismissed);
    assert!(ModerationAction::Ban.is_upheld());
    assert!(!ModerationAction::Dismiss.is_upheld());
}

// =============================================================================
// Community roles and events
// =============================================================================

#[test]
fn test_member_roles() {
    assert!(MemberRole::Admin.can_moderate());
    assert!(MemberRole::Moderator.can_moderate());
    assert!(!MemberRole::Member.can_moderate());
    assert!(!MemberRole::Banned.can_moderate());
    assert!(MemberRole::Banned.is_banned());
    assert!(!MemberRole::Banned.is_active());
    assert_eq!("moderator".parse::<MemberRole>().unwrap(), MemberRole::Moderator);
    assert!("owner".parse::<MemberRole>().is_err());
}

#[test]
fn test_event_capacity() {
    assert!(has_capacity(None, 10_000));
    assert!(has_capacity(Some(3), 2));
    assert!(!has_capacity(Some(3), 3));
    assert!(!has_capacity(Some(0), 0));
}

// =============================================================================
// Passwords
// =============================================================================

#[test]
fn test_password_hash_and_verify() {
    let password = Password::new("SecurePass123!").unwrap();
    assert!(password.verify("SecurePass123!"));
    assert!(!password.verify("securepass123!"));

    // Salted: same input, different hashes
    let again = Password::new("SecurePass123!").unwrap();
    assert_ne!(password.as_str(), again.as_str());
}
