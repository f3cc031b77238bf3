//! Shared test harness: a fully wired engine over an in-memory database.

use std::sync::Arc;

use crossbeam::channel::Receiver;
use uuid::Uuid;

use burgerrank::badges::BadgeEngine;
use burgerrank::matches::{EloConfig, MatchEngine, RewardConfig};
use burgerrank::notifications::{Notification, Notifier};
use burgerrank::points::PointsLedger;
use burgerrank::ranking::{RankingConfig, RankingScorer};
use burgerrank::ratings::{RatingInput, RatingService};
use burgerrank::storage::{Burger, BurgerStore, Database, Restaurant};

pub struct TestEngine {
    pub db: Arc<Database>,
    pub ledger: PointsLedger,
    pub badges: BadgeEngine,
    pub ratings: RatingService,
    pub matches: MatchEngine,
    pub scorer: RankingScorer,
    pub notifications: Receiver<Notification>,
}

/// Build a complete engine over a fresh in-memory database.
pub fn engine() -> TestEngine {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let (notifier, notifications) = Notifier::channel();

    let ledger = PointsLedger::new(db.clone(), notifier.clone());
    let badges = BadgeEngine::new(db.clone(), ledger.clone(), notifier.clone());
    badges.seed_catalog().unwrap();

    let ratings = RatingService::new(db.clone(), ledger.clone(), badges.clone());
    let matches = MatchEngine::new(
        db.clone(),
        ledger.clone(),
        badges.clone(),
        notifier,
        EloConfig::default(),
        RewardConfig::default(),
    );
    let scorer = RankingScorer::new(db.clone(), RankingConfig::default(), EloConfig::default());

    TestEngine {
        db,
        ledger,
        badges,
        ratings,
        matches,
        scorer,
        notifications,
    }
}

/// Insert one restaurant with `count` burgers and return the burger ids.
pub fn seed_burgers(db: &Database, count: usize) -> Vec<Uuid> {
    let conn = db.connection();
    let store = BurgerStore::new(&conn);

    let restaurant = Restaurant::new("Stacked".to_string(), "lyon".to_string());
    store.insert_restaurant(&restaurant).unwrap();

    (0..count)
        .map(|i| {
            let burger = Burger::new(restaurant.id, format!("Burger {i}"), "lyon".to_string());
            store.insert_burger(&burger).unwrap();
            burger.id
        })
        .collect()
}

/// Minimal rating input.
pub fn stars(overall: u8, ticketed: bool) -> RatingInput {
    RatingInput {
        overall_rating: overall,
        has_ticket: ticketed,
        ..Default::default()
    }
}
