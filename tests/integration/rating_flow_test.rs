//! End-to-end rating flows: points, aggregates, conflicts, and edits.

use uuid::Uuid;

use burgerrank::ratings::{RatingError, RatingInput};
use burgerrank::storage::BurgerStore;

use crate::harness::{engine, seed_burgers, stars};

#[test]
fn test_two_users_rate_one_burger() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];

    // User A: 5 stars with a ticket
    let user_a = Uuid::new_v4();
    let outcome = env.ratings.create_rating(user_a, burger, stars(5, true)).unwrap();
    assert_eq!(outcome.points_earned, 6);
    assert_eq!(outcome.rating.points_awarded, 6);
    assert!(outcome.new_badges.iter().any(|b| b.badge_id == "first_bite"));

    {
        let conn = env.db.connection();
        let loaded = BurgerStore::new(&conn).get_burger(burger).unwrap().unwrap();
        assert!((loaded.aggregate_rating - 5.0).abs() < f64::EPSILON);
        assert_eq!(loaded.rating_count, 1);
    }

    // User B: 3 stars without a ticket
    let user_b = Uuid::new_v4();
    let outcome = env.ratings.create_rating(user_b, burger, stars(3, false)).unwrap();
    assert_eq!(outcome.points_earned, 0);

    let conn = env.db.connection();
    let loaded = BurgerStore::new(&conn).get_burger(burger).unwrap().unwrap();
    assert!((loaded.aggregate_rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(loaded.rating_count, 2);
}

#[test]
fn test_points_table_across_star_values() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 5);

    let expected = [(5u8, 6i64), (4, 4), (3, 2), (2, 1), (1, 1)];
    for (i, (stars_given, points)) in expected.iter().enumerate() {
        let outcome = env
            .ratings
            .create_rating(Uuid::new_v4(), burgers[i], stars(*stars_given, true))
            .unwrap();
        assert_eq!(
            outcome.points_earned, *points,
            "{stars_given} stars should earn {points} points"
        );
    }
}

#[test]
fn test_duplicate_rating_conflict_carries_existing() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];
    let user = Uuid::new_v4();

    let first = env.ratings.create_rating(user, burger, stars(4, true)).unwrap();

    match env.ratings.create_rating(user, burger, stars(2, false)) {
        Err(RatingError::AlreadyRated(existing)) => {
            assert_eq!(existing.id, first.rating.id);
            assert_eq!(existing.overall_rating, 4);
        }
        other => panic!("expected AlreadyRated, got {other:?}"),
    }

    // The rejected submission wrote nothing
    let conn = env.db.connection();
    let loaded = BurgerStore::new(&conn).get_burger(burger).unwrap().unwrap();
    assert_eq!(loaded.rating_count, 1);
}

#[test]
fn test_edit_moves_total_by_exact_diff_only() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];
    let user = Uuid::new_v4();

    let created = env.ratings.create_rating(user, burger, stars(3, true)).unwrap();
    let before = env.ledger.balance(user).unwrap().total;

    // Upgrade to 5 stars: 2 -> 6 points
    let updated = env
        .ratings
        .update_rating(user, created.rating.id, stars(5, true))
        .unwrap();
    assert_eq!(updated.points_diff, 4);
    assert_eq!(env.ledger.balance(user).unwrap().total, before + 4);

    // Drop the ticket: 6 -> 0 points
    let updated = env
        .ratings
        .update_rating(user, created.rating.id, stars(5, false))
        .unwrap();
    assert_eq!(updated.points_diff, -6);
    assert_eq!(env.ledger.balance(user).unwrap().total, before - 2);
}

#[test]
fn test_aggregate_tracks_create_edit_remove() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];

    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let a = env.ratings.create_rating(user_a, burger, stars(5, false)).unwrap();
    env.ratings.create_rating(user_b, burger, stars(1, false)).unwrap();

    let mean = |db: &burgerrank::storage::Database| {
        let conn = db.connection();
        let b = BurgerStore::new(&conn).get_burger(burger).unwrap().unwrap();
        (b.aggregate_rating, b.rating_count)
    };

    assert_eq!(mean(&env.db), (3.0, 2));

    env.ratings
        .update_rating(user_a, a.rating.id, stars(3, false))
        .unwrap();
    assert_eq!(mean(&env.db), (2.0, 2));

    env.ratings.remove_rating(a.rating.id).unwrap();
    assert_eq!(mean(&env.db), (1.0, 1));
}

#[test]
fn test_full_input_round_trip() {
    let env = engine();
    let burger = seed_burgers(&env.db, 1)[0];
    let user = Uuid::new_v4();

    let input = RatingInput {
        overall_rating: 4,
        bread: Some(3),
        meat: Some(2),
        toppings: Some(3),
        sauce: Some(1),
        has_ticket: true,
        ticket_url: Some("https://tickets.example/abc".to_string()),
        price: Some(12.5),
        comment: Some("Toasted bun, juicy patty.".to_string()),
        consumption_type: Some(burgerrank::ratings::ConsumptionType::Local),
        appetizers: vec!["fries".to_string()],
    };

    env.ratings.create_rating(user, burger, input).unwrap();
    let loaded = env.ratings.rating_for(user, burger).unwrap().unwrap();

    assert_eq!(loaded.bread, Some(3));
    assert_eq!(loaded.sauce, Some(1));
    assert_eq!(loaded.price, Some(12.5));
    assert_eq!(loaded.comment.as_deref(), Some("Toasted bun, juicy patty."));
    assert_eq!(loaded.appetizers, vec!["fries"]);
    assert_eq!(loaded.points_awarded, 4);
}
