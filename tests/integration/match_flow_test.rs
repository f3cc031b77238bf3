//! End-to-end match flows: ELO movement, history, and the daily cadence.

use uuid::Uuid;

use burgerrank::matches::MatchError;
use burgerrank::storage::BurgerStore;

use crate::harness::{engine, seed_burgers, stars};

fn rate_all(env: &crate::harness::TestEngine, user: Uuid, burgers: &[Uuid]) {
    for burger in burgers {
        env.ratings.create_rating(user, *burger, stars(4, false)).unwrap();
    }
}

#[test]
fn test_equal_scores_split_k_factor() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);
    let user = Uuid::new_v4();
    rate_all(&env, user, &burgers);

    // Both burgers start from the assumed 4-star baseline of 1200
    env.matches
        .submit_match(user, burgers[0], burgers[1], burgers[0])
        .unwrap();

    let conn = env.db.connection();
    let store = BurgerStore::new(&conn);
    let p = store.get_burger(burgers[0]).unwrap().unwrap();
    let q = store.get_burger(burgers[1]).unwrap().unwrap();

    assert!((p.elo_score.unwrap() - 1216.0).abs() < 1e-9);
    assert!((q.elo_score.unwrap() - 1184.0).abs() < 1e-9);
}

#[test]
fn test_elo_is_zero_sum_across_many_matches() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 4);
    let user = Uuid::new_v4();
    rate_all(&env, user, &burgers);

    for i in 0..12 {
        let a = burgers[i % 4];
        let b = burgers[(i + 1) % 4];
        let winner = if i % 3 == 0 { a } else { b };
        env.matches.submit_match(user, a, b, winner).unwrap();
    }

    let conn = env.db.connection();
    let store = BurgerStore::new(&conn);
    let total: f64 = burgers
        .iter()
        .map(|id| store.get_burger(*id).unwrap().unwrap().elo_score.unwrap())
        .sum();

    // Every update moves points between the pair, never creating any
    assert!((total - 4.0 * 1200.0).abs() < 1e-6);
}

#[test]
fn test_match_history_is_append_only_with_snapshots() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);
    let user = Uuid::new_v4();
    rate_all(&env, user, &burgers);

    env.matches
        .submit_match(user, burgers[0], burgers[1], burgers[0])
        .unwrap();
    env.matches
        .submit_match(user, burgers[0], burgers[1], burgers[1])
        .unwrap();

    let conn = env.db.connection();
    let mut stmt = conn
        .prepare(
            "SELECT score_a_before, score_a_after FROM match_records
             WHERE user_id = ?1 ORDER BY created_at ASC, score_a_before ASC",
        )
        .unwrap();
    let rows: Vec<(f64, f64)> = stmt
        .query_map([user.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    // The second match starts where the first left burger A
    assert!((rows[0].0 - 1200.0).abs() < 1e-9);
    assert!((rows[0].1 - 1216.0).abs() < 1e-9);
    assert!((rows[1].0 - 1216.0).abs() < 1e-9);
}

#[test]
fn test_tenth_and_twentieth_match_pay_out() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);
    let user = Uuid::new_v4();
    rate_all(&env, user, &burgers);

    let mut paid_at = Vec::new();
    for i in 1..=20 {
        let outcome = env
            .matches
            .submit_match(user, burgers[0], burgers[1], burgers[1])
            .unwrap();
        if outcome.points_earned > 0 {
            assert_eq!(outcome.points_earned, 5);
            paid_at.push(i);
        }
    }

    assert_eq!(paid_at, vec![10, 20]);
}

#[test]
fn test_pair_selection_draws_from_rated_pool() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 6);
    let user = Uuid::new_v4();
    // Rate only the first three
    rate_all(&env, user, &burgers[..3]);

    for _ in 0..10 {
        let pair = env.matches.get_match_pair(user).unwrap();
        assert_ne!(pair.burger_a.id, pair.burger_b.id);
        assert!(burgers[..3].contains(&pair.burger_a.id));
        assert!(burgers[..3].contains(&pair.burger_b.id));
        assert_eq!(pair.burger_a.restaurant_name, "Stacked");
    }
}

#[test]
fn test_pair_selection_never_blocks_on_repeats() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 2);
    let user = Uuid::new_v4();
    rate_all(&env, user, &burgers);

    // With a two-burger pool every draw repeats the same pair; the retry
    // budget must hand it back anyway
    for _ in 0..5 {
        let pair = env.matches.get_match_pair(user).unwrap();
        env.matches
            .submit_match(user, pair.burger_a.id, pair.burger_b.id, pair.burger_a.id)
            .unwrap();
    }
}

#[test]
fn test_match_requires_two_rated_burgers() {
    let env = engine();
    let burgers = seed_burgers(&env.db, 3);
    let user = Uuid::new_v4();
    env.ratings
        .create_rating(user, burgers[0], stars(4, false))
        .unwrap();

    assert!(matches!(
        env.matches.get_match_pair(user),
        Err(MatchError::NotEnoughRated { have: 1 })
    ));
}
