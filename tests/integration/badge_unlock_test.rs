//! Badge progression: exactly-once unlocks, notifications, and listings.

use std::thread;

use uuid::Uuid;

use burgerrank::badges::GameEvent;
use burgerrank::notifications::Notification;

use crate::harness::{engine, seed_burgers, stars};

#[test]
fn test_first_review_unlocks_badge_and_pays_once() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];
    let user = Uuid::new_v4();

    let outcome = env.ratings.create_rating(user, burger, stars(4, false)).unwrap();
    assert_eq!(outcome.new_badges.len(), 1);
    assert_eq!(outcome.new_badges[0].badge_id, "first_bite");

    // Redundant re-checks change nothing
    for _ in 0..3 {
        let again = env.badges.handle_event(user, &GameEvent::ReviewSubmitted).unwrap();
        assert!(again.is_empty());
    }

    assert_eq!(env.ledger.balance(user).unwrap().total, 10);
}

#[test]
fn test_concurrent_events_unlock_exactly_once() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];
    let user = Uuid::new_v4();

    env.ratings.create_rating(user, burger, stars(5, false)).unwrap();
    // Absorb the first_bite unlock from the create path
    let base_total = env.ledger.balance(user).unwrap().total;

    // Push the follower stat over two thresholds from racing handlers
    let unlock_counts: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let badges = env.badges.clone();
                scope.spawn(move || {
                    badges
                        .handle_event(user, &GameEvent::FollowerAdded { total: 120 })
                        .unwrap()
                        .len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // crowd_favorite (25) and influencer (100) unlock once each, across
    // all eight racing events combined
    let total_unlocks: usize = unlock_counts.iter().sum();
    assert_eq!(total_unlocks, 2);

    // 50 + 150 points, credited exactly once each
    let balance = env.ledger.balance(user).unwrap();
    assert_eq!(balance.total, base_total + 200);
}

#[test]
fn test_unlock_notifications_reach_the_outbox() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];
    let user = Uuid::new_v4();

    env.ratings.create_rating(user, burger, stars(5, true)).unwrap();

    let mut badge_unlocks = 0;
    let mut point_awards = 0;
    while let Ok(notification) = env.notifications.try_recv() {
        match notification {
            Notification::BadgeUnlocked { badge_id, .. } => {
                assert_eq!(badge_id, "first_bite");
                badge_unlocks += 1;
            }
            Notification::PointsAwarded { .. } => point_awards += 1,
            Notification::LevelUp { .. } => {}
        }
    }

    assert_eq!(badge_unlocks, 1);
    // One rating reward, one badge reward
    assert_eq!(point_awards, 2);
}

#[test]
fn test_badges_for_user_reports_progress_and_unlocks() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 3);
    let user = Uuid::new_v4();

    for burger in &burgers {
        env.ratings.create_rating(user, *burger, stars(5, false)).unwrap();
    }

    let statuses = env.badges.badges_for_user(user).unwrap();

    let first_bite = statuses.iter().find(|s| s.badge_id == "first_bite").unwrap();
    assert!(first_bite.unlocked);
    assert!(first_bite.unlocked_at.is_some());
    assert_eq!(first_bite.progress, 3);

    let regular = statuses.iter().find(|s| s.badge_id == "regular").unwrap();
    assert!(!regular.unlocked);
    assert_eq!(regular.progress, 3);
    assert_eq!(regular.target, 10);

    let five_star = statuses.iter().find(|s| s.badge_id == "five_star_fan").unwrap();
    assert_eq!(five_star.progress, 3);
}

#[test]
fn test_external_check_and_unlock_contract() {
    let env = engine();
    let user = Uuid::new_v4();

    // Below target: progress persists, nothing unlocks
    let result = env.badges.check_and_unlock(user, "shutterbug", 4).unwrap();
    assert!(result.is_none());

    let statuses = env.badges.badges_for_user(user).unwrap();
    let shutterbug = statuses.iter().find(|s| s.badge_id == "shutterbug").unwrap();
    assert_eq!(shutterbug.progress, 4);

    // At target: unlocks and reports the reward
    let unlocked = env.badges.check_and_unlock(user, "shutterbug", 10).unwrap().unwrap();
    assert_eq!(unlocked.points_reward, 25);

    // Progress beyond target after unlock is a no-op
    let again = env.badges.check_and_unlock(user, "shutterbug", 99).unwrap();
    assert!(again.is_none());
}
