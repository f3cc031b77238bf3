//! Burger match engine.
//!
//! Pairs burgers the user has already rated, records the outcome, and moves
//! both ELO scores. Matches feed the points ledger on a daily cadence and
//! the badge engine through the match-completed event.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone, Utc};
use rand::seq::SliceRandom;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::elo::{self, EloConfig};
use crate::badges::{BadgeEngine, GameEvent};
use crate::notifications::{Notification, Notifier};
use crate::points::{LevelPolicy, PointsError, PointsLedger, PointsPerLevel, PointsReason};
use crate::storage::Database;

/// Redraw budget when avoiding recently seen pairs.
const PAIR_RETRY_LIMIT: usize = 10;

/// How many of the user's latest matches count as "recent".
const RECENT_MATCH_WINDOW: usize = 20;

/// Gamification cadence for match rewards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Award points on every Nth match of the day.
    pub match_reward_interval: i64,
    /// Points granted at each interval.
    pub match_reward_points: i64,
    /// Points per numeric level.
    pub points_per_level: i64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            match_reward_interval: 10,
            match_reward_points: 5,
            points_per_level: 100,
        }
    }
}

/// One side of a match pair, with enough context to render a card.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub id: Uuid,
    pub name: String,
    pub burger_type: Option<String>,
    pub image_url: Option<String>,
    pub match_score: f64,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub restaurant_city: String,
}

/// A pair of burgers to compare.
#[derive(Debug, Clone, Serialize)]
pub struct MatchPair {
    pub burger_a: MatchCandidate,
    pub burger_b: MatchCandidate,
}

/// Result of a submitted match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub match_count_today: i64,
    pub points_earned: i64,
    pub level_up: bool,
    pub new_level: u32,
}

/// Match engine service.
pub struct MatchEngine {
    db: Arc<Database>,
    ledger: PointsLedger,
    badges: BadgeEngine,
    notifier: Notifier,
    elo: EloConfig,
    rewards: RewardConfig,
}

impl MatchEngine {
    /// Create a new match engine.
    pub fn new(
        db: Arc<Database>,
        ledger: PointsLedger,
        badges: BadgeEngine,
        notifier: Notifier,
        elo: EloConfig,
        rewards: RewardConfig,
    ) -> Self {
        Self {
            db,
            ledger,
            badges,
            notifier,
            elo,
            rewards,
        }
    }

    /// Draw a pair of distinct burgers from the user's rated pool,
    /// preferring pairs the user has not seen in their last 20 matches.
    /// Bounded retries; never blocks waiting for a fresh pair.
    pub fn get_match_pair(&self, user_id: Uuid) -> Result<MatchPair, MatchError> {
        let (pool, recent) = {
            let conn = self.db.connection();

            let mut stmt = conn.prepare(
                "SELECT DISTINCT burger_id FROM ratings WHERE user_id = ?1 AND deleted = 0",
            )?;
            let rows = stmt.query_map(params![user_id.to_string()], |row| {
                row.get::<_, String>(0)
            })?;
            let pool = rows.collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT burger_a_id, burger_b_id FROM match_records
                 WHERE user_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(
                params![user_id.to_string(), RECENT_MATCH_WINDOW as i64],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )?;
            let recent: HashSet<(String, String)> = rows
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|(a, b)| normalize_pair(a, b))
                .collect();

            (pool, recent)
        };

        if pool.len() < 2 {
            return Err(MatchError::NotEnoughRated { have: pool.len() });
        }

        let mut rng = rand::thread_rng();
        let mut candidate: Option<(String, String)> = None;

        for _ in 0..PAIR_RETRY_LIMIT {
            let picks: Vec<&String> = pool.choose_multiple(&mut rng, 2).collect();
            let pair = (picks[0].clone(), picks[1].clone());
            let fresh = !recent.contains(&normalize_pair(pair.0.clone(), pair.1.clone()));
            candidate = Some(pair);
            if fresh {
                break;
            }
        }

        // The retry budget may be exhausted; serve the last draw regardless
        let (a, b) = candidate.ok_or(MatchError::NotEnoughRated { have: pool.len() })?;
        let burger_a = self.load_candidate(&a)?;
        let burger_b = self.load_candidate(&b)?;

        Ok(MatchPair { burger_a, burger_b })
    }

    /// Record a match outcome: move both ELO scores, append the match
    /// record, and run the daily reward cadence.
    pub fn submit_match(
        &self,
        user_id: Uuid,
        burger_a_id: Uuid,
        burger_b_id: Uuid,
        winner_id: Uuid,
    ) -> Result<MatchOutcome, MatchError> {
        if burger_a_id == burger_b_id {
            return Err(MatchError::InvalidPair);
        }
        if winner_id != burger_a_id && winner_id != burger_b_id {
            return Err(MatchError::InvalidWinner(winner_id));
        }

        let match_count_today = {
            let mut conn = self.db.connection();
            let tx = conn.transaction()?;

            let score_a_before = Self::current_score(&tx, burger_a_id, &self.elo)?;
            let score_b_before = Self::current_score(&tx, burger_b_id, &self.elo)?;

            let a_won = winner_id == burger_a_id;
            let (score_a_after, score_b_after) =
                elo::rate_pair(score_a_before, score_b_before, a_won, self.elo.k_factor);

            tx.execute(
                "UPDATE burgers SET elo_score = ?2 WHERE id = ?1",
                params![burger_a_id.to_string(), score_a_after],
            )?;
            tx.execute(
                "UPDATE burgers SET elo_score = ?2 WHERE id = ?1",
                params![burger_b_id.to_string(), score_b_after],
            )?;

            let now = Utc::now();
            tx.execute(
                "INSERT INTO match_records
                 (id, user_id, burger_a_id, burger_b_id, winner_id,
                  score_a_before, score_b_before, score_a_after, score_b_after, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    burger_a_id.to_string(),
                    burger_b_id.to_string(),
                    winner_id.to_string(),
                    score_a_before,
                    score_b_before,
                    score_a_after,
                    score_b_after,
                    now.to_rfc3339(),
                ],
            )?;

            let since = local_midnight_utc().to_rfc3339();
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM match_records WHERE user_id = ?1 AND created_at >= ?2",
                params![user_id.to_string(), since],
                |row| row.get(0),
            )?;

            tx.commit()?;
            count
        };

        let mut points_earned = 0;
        let mut level_up = false;
        let policy = PointsPerLevel {
            points_per_level: self.rewards.points_per_level,
        };

        if match_count_today > 0 && match_count_today % self.rewards.match_reward_interval == 0 {
            points_earned = self.rewards.match_reward_points;
            let balance = self
                .ledger
                .credit(user_id, points_earned, PointsReason::MatchReward)?;

            let level_before = policy.level_for(balance.total - points_earned);
            let level_after = policy.level_for(balance.total);
            if level_after > level_before {
                level_up = true;
                self.notifier.notify(Notification::LevelUp {
                    user_id,
                    level: level_after,
                });
            }
        }

        let new_level = policy.level_for(self.ledger.balance(user_id)?.total);

        // Badge bookkeeping must not fail the recorded match
        if let Err(e) = self.badges.handle_event(user_id, &GameEvent::MatchCompleted) {
            tracing::warn!(%user_id, error = %e, "badge check after match failed");
        }

        Ok(MatchOutcome {
            match_count_today,
            points_earned,
            level_up,
            new_level,
        })
    }

    fn current_score(
        conn: &rusqlite::Connection,
        burger_id: Uuid,
        elo: &EloConfig,
    ) -> Result<f64, MatchError> {
        let score: Option<Option<f64>> = conn
            .query_row(
                "SELECT elo_score FROM burgers WHERE id = ?1",
                params![burger_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match score {
            Some(Some(score)) => Ok(score),
            Some(None) => Ok(elo.default_score()),
            None => Err(MatchError::UnknownBurger(burger_id)),
        }
    }

    fn load_candidate(&self, burger_id: &str) -> Result<MatchCandidate, MatchError> {
        let conn = self.db.connection();

        let row = conn
            .query_row(
                "SELECT b.id, b.name, b.burger_type, b.image_url, b.elo_score,
                        r.id, r.name, r.city
                 FROM burgers b
                 JOIN restaurants r ON b.restaurant_id = r.id
                 WHERE b.id = ?1",
                params![burger_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        let (id, name, burger_type, image_url, elo_score, rest_id, rest_name, rest_city) = row
            .ok_or_else(|| {
                MatchError::UnknownBurger(Uuid::parse_str(burger_id).unwrap_or_default())
            })?;

        Ok(MatchCandidate {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            name,
            burger_type,
            image_url,
            match_score: elo_score.unwrap_or_else(|| self.elo.default_score()),
            restaurant_id: Uuid::parse_str(&rest_id).unwrap_or_default(),
            restaurant_name: rest_name,
            restaurant_city: rest_city,
        })
    }
}

/// Order-insensitive key for a burger pair.
fn normalize_pair(a: String, b: String) -> (String, String) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Start of the user-facing day, in UTC.
fn local_midnight_utc() -> DateTime<Utc> {
    let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => midnight.and_utc(),
    }
}

/// Match engine errors.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("User has rated {have} burgers; at least 2 are required")]
    NotEnoughRated { have: usize },

    #[error("Burger not found: {0}")]
    UnknownBurger(Uuid),

    #[error("Winner {0} is not part of the match")]
    InvalidWinner(Uuid),

    #[error("A match requires two distinct burgers")]
    InvalidPair,

    #[error("Points error: {0}")]
    PointsError(#[from] PointsError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
