//! BurgerRank - Reputation & Ranking Engine
//!
//! Maintenance entry point: initializes storage, seeds the badge catalog,
//! and recomputes the persisted ranking scores.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use burgerrank::badges::BadgeEngine;
use burgerrank::notifications::Notifier;
use burgerrank::points::PointsLedger;
use burgerrank::ranking::RankingScorer;
use burgerrank::storage::{config, Database};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BurgerRank engine v{}", env!("CARGO_PKG_VERSION"));

    let engine_config = config::load_config()?;
    let db = Arc::new(Database::open(&engine_config.database_path())?);

    let notifier = Notifier::disabled();
    let ledger = PointsLedger::new(db.clone(), notifier.clone());
    let badges = BadgeEngine::new(db.clone(), ledger, notifier);
    badges.seed_catalog()?;
    tracing::info!("Badge catalog seeded");

    let scorer = RankingScorer::new(db, engine_config.ranking, engine_config.elo);
    let scored = scorer.refresh_all()?;
    tracing::info!("Recomputed ranking scores for {scored} burgers");

    for (position, burger) in scorer.top_burgers(10)?.iter().enumerate() {
        tracing::info!(
            "#{:<2} {:<30} score {:5.1}  ({} ratings, avg {:.2})",
            position + 1,
            burger.name,
            burger.ranking_score.unwrap_or(0.0),
            burger.rating_count,
            burger.aggregate_rating,
        );
    }

    Ok(())
}
