//! Composite ranking scorer.
//!
//! Combines the burger's aggregate rating, ticket verification, rater
//! levels, review volume, recency, and ELO standing into one 0-100 score.
//! The scorer is read-only with respect to the rest of the engine; scores
//! are recomputed on demand and the persisted `ranking_score` is a cache
//! for the listing UI, never authoritative.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::matches::EloConfig;
use crate::points::{LevelPolicy, PointsPerLevel};
use crate::storage::{Burger, BurgerStore, Database, StoreError};

/// Signal weights. They sum to 1.0 so each signal's 0-100 scale carries
/// straight through to the composite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankingWeights {
    pub average: f64,
    pub verified: f64,
    pub rater_level: f64,
    pub volume: f64,
    pub recency: f64,
    pub elo: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            average: 0.40,
            verified: 0.25,
            rater_level: 0.20,
            volume: 0.10,
            recency: 0.03,
            elo: 0.02,
        }
    }
}

/// Ranking tuning knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankingConfig {
    pub weights: RankingWeights,
    /// ELO normalization window.
    pub elo_floor: f64,
    pub elo_ceiling: f64,
    /// Days during which a new burger gets a decaying boost.
    pub recency_window_days: f64,
    /// Rating count below which the volume discount bites hard.
    pub low_volume_pivot: i64,
    /// Relative weight of a ticket-verified rating.
    pub verified_weight: f64,
    /// Cap on a high-level rater's weight relative to a novice.
    pub max_rater_weight: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            elo_floor: 800.0,
            elo_ceiling: 1600.0,
            recency_window_days: 30.0,
            low_volume_pivot: 5,
            verified_weight: 1.5,
            max_rater_weight: 2.0,
        }
    }
}

/// Per-signal decomposition, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RankingSignals {
    pub average: f64,
    pub verified: f64,
    pub rater_level: f64,
    pub volume: f64,
    pub recency: f64,
    pub elo: f64,
}

/// A scored burger.
#[derive(Debug, Clone, Serialize)]
pub struct RankingBreakdown {
    pub burger_id: Uuid,
    pub signals: RankingSignals,
    pub score: f64,
}

/// Weighted sum of the signals, clamped to [0, 100].
pub fn composite_score(signals: &RankingSignals, weights: &RankingWeights) -> f64 {
    let score = weights.average * signals.average
        + weights.verified * signals.verified
        + weights.rater_level * signals.rater_level
        + weights.volume * signals.volume
        + weights.recency * signals.recency
        + weights.elo * signals.elo;
    score.clamp(0.0, 100.0)
}

/// Low-sample discount: 0 with no ratings, strictly rising toward 1.0 as
/// the count grows, never reaching it.
pub fn volume_factor(rating_count: i64, pivot: i64) -> f64 {
    if rating_count <= 0 {
        return 0.0;
    }
    rating_count as f64 / (rating_count + pivot.max(1)) as f64
}

/// Linear new-burger boost: 1.0 at age zero, 0.0 at the window edge.
pub fn recency_boost(age_days: f64, window_days: f64) -> f64 {
    if window_days <= 0.0 || age_days >= window_days {
        return 0.0;
    }
    (1.0 - age_days.max(0.0) / window_days).clamp(0.0, 1.0)
}

/// Rescale an ELO score over a fixed reference window.
pub fn normalize_elo(score: f64, floor: f64, ceiling: f64) -> f64 {
    if ceiling <= floor {
        return 0.0;
    }
    ((score - floor) / (ceiling - floor)).clamp(0.0, 1.0)
}

/// Ranking scorer service.
pub struct RankingScorer {
    db: Arc<Database>,
    config: RankingConfig,
    elo: EloConfig,
    levels: PointsPerLevel,
}

impl RankingScorer {
    /// Create a new ranking scorer.
    pub fn new(db: Arc<Database>, config: RankingConfig, elo: EloConfig) -> Self {
        Self {
            db,
            config,
            elo,
            levels: PointsPerLevel::default(),
        }
    }

    /// Compute the composite score with its per-signal decomposition.
    pub fn score_breakdown(&self, burger_id: Uuid) -> Result<RankingBreakdown, RankingError> {
        let conn = self.db.connection();

        let burger = BurgerStore::new(&conn)
            .get_burger(burger_id)?
            .ok_or(RankingError::UnknownBurger(burger_id))?;

        // Per-rating verification flag and rater point total
        let mut stmt = conn.prepare(
            "SELECT r.has_ticket, COALESCE(up.total_points, 0)
             FROM ratings r
             LEFT JOIN user_points up ON up.user_id = r.user_id
             WHERE r.burger_id = ?1 AND r.deleted = 0",
        )?;
        let rows = stmt.query_map(params![burger_id.to_string()], |row| {
            Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?))
        })?;
        let ratings = rows.collect::<Result<Vec<_>, _>>()?;

        let signals = self.signals(&burger, &ratings);
        let score = composite_score(&signals, &self.config.weights);

        Ok(RankingBreakdown {
            burger_id,
            signals,
            score,
        })
    }

    /// Compute and persist the composite score.
    pub fn refresh_score(&self, burger_id: Uuid) -> Result<f64, RankingError> {
        let breakdown = self.score_breakdown(burger_id)?;

        let conn = self.db.connection();
        BurgerStore::new(&conn).set_ranking_score(burger_id, breakdown.score)?;

        Ok(breakdown.score)
    }

    /// Recompute every burger's persisted score. Returns how many burgers
    /// were scored.
    pub fn refresh_all(&self) -> Result<usize, RankingError> {
        let burgers = {
            let conn = self.db.connection();
            BurgerStore::new(&conn).list_burgers()?
        };

        for burger in &burgers {
            self.refresh_score(burger.id)?;
        }

        Ok(burgers.len())
    }

    /// Burgers ordered by persisted ranking score, best first.
    pub fn top_burgers(&self, limit: usize) -> Result<Vec<Burger>, RankingError> {
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT id, restaurant_id, name, burger_type, image_url, city,
                    aggregate_rating, rating_count, elo_score, ranking_score,
                    featured_order, created_at
             FROM burgers
             ORDER BY ranking_score IS NULL, ranking_score DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], crate::storage::burger_store::parse_burger_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(RankingError::from)
    }

    fn signals(&self, burger: &Burger, ratings: &[(bool, i64)]) -> RankingSignals {
        let config = &self.config;
        let count = ratings.len() as i64;

        let average = (burger.aggregate_rating / 5.0).clamp(0.0, 1.0) * 100.0;

        let verified = if count == 0 {
            0.0
        } else {
            let verified_count = ratings.iter().filter(|(ticket, _)| *ticket).count() as f64;
            let unverified_count = count as f64 - verified_count;
            let weighted = config.verified_weight * verified_count;
            (weighted / (weighted + unverified_count)) * 100.0
        };

        let rater_level = if count == 0 {
            0.0
        } else {
            let mean_weight: f64 = ratings
                .iter()
                .map(|(_, total_points)| {
                    let level = self.levels.level_for(*total_points) as f64;
                    (1.0 + level / 10.0).min(config.max_rater_weight)
                })
                .sum::<f64>()
                / count as f64;
            ((mean_weight - 1.0) / (config.max_rater_weight - 1.0)).clamp(0.0, 1.0) * 100.0
        };

        let volume = volume_factor(count, config.low_volume_pivot) * 100.0;

        let age_days = (Utc::now() - burger.created_at).num_seconds() as f64 / 86_400.0;
        let recency = recency_boost(age_days, config.recency_window_days) * 100.0;

        let elo_score = burger.elo_score.unwrap_or_else(|| self.elo.default_score());
        let elo = normalize_elo(elo_score, config.elo_floor, config.elo_ceiling) * 100.0;

        RankingSignals {
            average,
            verified,
            rater_level,
            volume,
            recency,
            elo,
        }
    }
}

/// Ranking errors.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Burger not found: {0}")]
    UnknownBurger(Uuid),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
