//! Composite ranking over live engine state.

use uuid::Uuid;

use crate::harness::{engine, seed_burgers, stars};

#[test]
fn test_better_rated_burger_ranks_higher() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);

    for _ in 0..6 {
        env.ratings
            .create_rating(Uuid::new_v4(), burgers[0], stars(5, true))
            .unwrap();
        env.ratings
            .create_rating(Uuid::new_v4(), burgers[1], stars(2, false))
            .unwrap();
    }

    env.scorer.refresh_all().unwrap();
    let top = env.scorer.top_burgers(10).unwrap();

    assert_eq!(top[0].id, burgers[0]);
    assert!(top[0].ranking_score.unwrap() > top[1].ranking_score.unwrap());
}

#[test]
fn test_verified_ratings_outrank_unverified_at_same_stars() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);

    for _ in 0..5 {
        env.ratings
            .create_rating(Uuid::new_v4(), burgers[0], stars(4, true))
            .unwrap();
        env.ratings
            .create_rating(Uuid::new_v4(), burgers[1], stars(4, false))
            .unwrap();
    }

    let verified = env.scorer.score_breakdown(burgers[0]).unwrap();
    let unverified = env.scorer.score_breakdown(burgers[1]).unwrap();

    assert!((verified.signals.average - unverified.signals.average).abs() < 1e-9);
    assert!(verified.signals.verified > unverified.signals.verified);
    assert!(verified.score > unverified.score);
}

#[test]
fn test_match_wins_lift_the_elo_signal() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);
    let user = Uuid::new_v4();

    for burger in &burgers {
        env.ratings.create_rating(user, *burger, stars(4, false)).unwrap();
    }

    let before = env.scorer.score_breakdown(burgers[0]).unwrap();
    for _ in 0..5 {
        env.matches
            .submit_match(user, burgers[0], burgers[1], burgers[0])
            .unwrap();
    }
    let after = env.scorer.score_breakdown(burgers[0]).unwrap();

    assert!(after.signals.elo > before.signals.elo);
    assert!(after.score > before.score);
}

#[test]
fn test_high_level_raters_lift_the_score() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);

    let novice = Uuid::new_v4();
    let veteran = Uuid::new_v4();
    // A veteran rater several levels deep
    env.ledger
        .credit(veteran, 500, burgerrank::points::PointsReason::BadgeReward)
        .unwrap();

    env.ratings.create_rating(novice, burgers[0], stars(4, false)).unwrap();
    env.ratings.create_rating(veteran, burgers[1], stars(4, false)).unwrap();

    let by_novice = env.scorer.score_breakdown(burgers[0]).unwrap();
    let by_veteran = env.scorer.score_breakdown(burgers[1]).unwrap();

    assert!((by_novice.signals.rater_level - 0.0).abs() < f64::EPSILON);
    assert!(by_veteran.signals.rater_level > 0.0);
}

#[test]
fn test_scores_stay_in_bounds() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 3);

    env.ratings
        .create_rating(Uuid::new_v4(), burgers[0], stars(5, true))
        .unwrap();
    env.ratings
        .create_rating(Uuid::new_v4(), burgers[1], stars(1, false))
        .unwrap();
    // burgers[2] has no ratings at all

    for burger in &burgers {
        let breakdown = env.scorer.score_breakdown(*burger).unwrap();
        assert!(
            (0.0..=100.0).contains(&breakdown.score),
            "score {} out of bounds",
            breakdown.score
        );
    }
}
