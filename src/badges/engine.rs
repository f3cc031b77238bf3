//! Badge progression and unlocking.
//!
//! Progress is recomputed from current stats on every qualifying event, so
//! checks are idempotent and safe to run redundantly or out of order. The
//! unlock itself is a single conditional update: of any number of concurrent
//! checks for the same (user, badge), exactly one flips the row and awards
//! the bonus points.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use super::types::{default_badges, Badge, BadgeCondition, BadgeStatus, GameEvent, UnlockedBadge};
use crate::notifications::{Notification, Notifier};
use crate::points::{PointsError, PointsLedger, PointsReason};
use crate::storage::Database;

/// Badge progression engine.
#[derive(Clone)]
pub struct BadgeEngine {
    db: Arc<Database>,
    ledger: PointsLedger,
    notifier: Notifier,
}

impl BadgeEngine {
    /// Create a new badge engine.
    pub fn new(db: Arc<Database>, ledger: PointsLedger, notifier: Notifier) -> Self {
        Self {
            db,
            ledger,
            notifier,
        }
    }

    /// Insert the default catalog if not present.
    pub fn seed_catalog(&self) -> Result<(), BadgeError> {
        let conn = self.db.connection();

        for badge in default_badges() {
            conn.execute(
                "INSERT OR IGNORE INTO badges
                 (id, name, description, emoji, condition_kind, target, points_reward)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    badge.id,
                    badge.name,
                    badge.description,
                    badge.emoji,
                    badge.condition.as_str(),
                    badge.target,
                    badge.points_reward,
                ],
            )?;
        }

        Ok(())
    }

    /// Create zeroed progress rows for every catalog badge. Called at
    /// account provisioning; safe to repeat.
    pub fn provision_user(&self, user_id: Uuid) -> Result<(), BadgeError> {
        let conn = self.db.connection();
        let now = Utc::now().to_rfc3339();

        let badge_ids: Vec<String> = {
            let mut stmt = conn.prepare("SELECT id FROM badges")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        for badge_id in badge_ids {
            conn.execute(
                "INSERT OR IGNORE INTO user_badges
                 (id, user_id, badge_id, progress, unlocked, updated_at)
                 VALUES (?1, ?2, ?3, 0, 0, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    badge_id,
                    now,
                ],
            )?;
        }

        Ok(())
    }

    /// Process a gameplay event: recompute the progress counters the event
    /// touches and unlock any badge whose target is now met.
    pub fn handle_event(
        &self,
        user_id: Uuid,
        event: &GameEvent,
    ) -> Result<Vec<UnlockedBadge>, BadgeError> {
        let mut newly_unlocked = Vec::new();

        for condition in event.touched_conditions() {
            let progress = self.progress_for(user_id, *condition, event.external_total())?;
            let badges = self.badges_with_condition(*condition)?;

            for badge in badges {
                if let Some(unlocked) = self.apply_progress(user_id, &badge, progress)? {
                    newly_unlocked.push(unlocked);
                }
            }
        }

        Ok(newly_unlocked)
    }

    /// Refresh one badge against a progress value and unlock it when the
    /// target is met. Exposed for callers that own the underlying stat.
    pub fn check_and_unlock(
        &self,
        user_id: Uuid,
        badge_id: &str,
        current_progress: i64,
    ) -> Result<Option<UnlockedBadge>, BadgeError> {
        let badge = self
            .get_badge(badge_id)?
            .ok_or_else(|| BadgeError::UnknownBadge(badge_id.to_string()))?;
        self.apply_progress(user_id, &badge, current_progress)
    }

    /// All badges with a user's progress toward each.
    pub fn badges_for_user(&self, user_id: Uuid) -> Result<Vec<BadgeStatus>, BadgeError> {
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT b.id, b.name, b.emoji, b.target,
                    COALESCE(ub.progress, 0), COALESCE(ub.unlocked, 0), ub.unlocked_at
             FROM badges b
             LEFT JOIN user_badges ub ON ub.badge_id = b.id AND ub.user_id = ?1
             ORDER BY b.target ASC, b.id ASC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            let unlocked_at_str: Option<String> = row.get(6)?;
            Ok(BadgeStatus {
                badge_id: row.get(0)?,
                name: row.get(1)?,
                emoji: row.get(2)?,
                target: row.get(3)?,
                progress: row.get(4)?,
                unlocked: row.get(5)?,
                unlocked_at: unlocked_at_str.and_then(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .map(|t| t.with_timezone(&Utc))
                        .ok()
                }),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(BadgeError::from)
    }

    /// Recompute a progress counter from current stats.
    fn progress_for(
        &self,
        user_id: Uuid,
        condition: BadgeCondition,
        external_total: Option<i64>,
    ) -> Result<i64, BadgeError> {
        let conn = self.db.connection();

        let count = match condition {
            BadgeCondition::ReviewCount => Self::count_ratings(&conn, user_id, None, None)?,
            BadgeCondition::FiveStarCount => Self::count_ratings(&conn, user_id, Some(5), None)?,
            BadgeCondition::OneStarCount => Self::count_ratings(&conn, user_id, Some(1), None)?,
            BadgeCondition::VerifiedReviewCount => {
                Self::count_ratings(&conn, user_id, None, Some(true))?
            }
            BadgeCondition::MatchCount => conn.query_row(
                "SELECT COUNT(*) FROM match_records WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| row.get(0),
            )?,
            BadgeCondition::PhotoCount
            | BadgeCondition::FollowerCount
            | BadgeCondition::LikeCount => external_total.unwrap_or(0),
        };

        Ok(count)
    }

    fn count_ratings(
        conn: &Connection,
        user_id: Uuid,
        stars: Option<i64>,
        verified: Option<bool>,
    ) -> Result<i64, rusqlite::Error> {
        match (stars, verified) {
            (Some(stars), _) => conn.query_row(
                "SELECT COUNT(*) FROM ratings
                 WHERE user_id = ?1 AND deleted = 0 AND overall_rating = ?2",
                params![user_id.to_string(), stars],
                |row| row.get(0),
            ),
            (None, Some(true)) => conn.query_row(
                "SELECT COUNT(*) FROM ratings
                 WHERE user_id = ?1 AND deleted = 0 AND has_ticket = 1",
                params![user_id.to_string()],
                |row| row.get(0),
            ),
            (None, _) => conn.query_row(
                "SELECT COUNT(*) FROM ratings WHERE user_id = ?1 AND deleted = 0",
                params![user_id.to_string()],
                |row| row.get(0),
            ),
        }
    }

    /// Persist refreshed progress; unlock and award when the target is met.
    fn apply_progress(
        &self,
        user_id: Uuid,
        badge: &Badge,
        progress: i64,
    ) -> Result<Option<UnlockedBadge>, BadgeError> {
        let now = Utc::now();

        let unlocked = {
            let conn = self.db.connection();
            Self::ensure_progress_row(&conn, user_id, &badge.id, &now)?;

            if progress >= badge.target {
                // The conditional update is the unlock gate: exactly one of
                // any concurrent checks sees unlocked = 0 here.
                let updated = conn.execute(
                    "UPDATE user_badges
                     SET unlocked = 1, progress = ?3, unlocked_at = ?4, updated_at = ?4
                     WHERE user_id = ?1 AND badge_id = ?2 AND unlocked = 0",
                    params![
                        user_id.to_string(),
                        badge.id,
                        progress,
                        now.to_rfc3339(),
                    ],
                )?;
                updated == 1
            } else {
                conn.execute(
                    "UPDATE user_badges
                     SET progress = ?3, updated_at = ?4
                     WHERE user_id = ?1 AND badge_id = ?2 AND unlocked = 0",
                    params![
                        user_id.to_string(),
                        badge.id,
                        progress,
                        now.to_rfc3339(),
                    ],
                )?;
                false
            }
        };

        if !unlocked {
            return Ok(None);
        }

        self.ledger
            .credit(user_id, badge.points_reward, PointsReason::BadgeReward)?;
        self.notifier.notify(Notification::BadgeUnlocked {
            user_id,
            badge_id: badge.id.clone(),
            name: badge.name.clone(),
            emoji: badge.emoji.clone(),
            points_reward: badge.points_reward,
        });
        tracing::info!(%user_id, badge_id = %badge.id, "badge unlocked");

        Ok(Some(UnlockedBadge {
            badge_id: badge.id.clone(),
            name: badge.name.clone(),
            emoji: badge.emoji.clone(),
            points_reward: badge.points_reward,
            unlocked_at: now,
        }))
    }

    fn ensure_progress_row(
        conn: &Connection,
        user_id: Uuid,
        badge_id: &str,
        now: &DateTime<Utc>,
    ) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT OR IGNORE INTO user_badges
             (id, user_id, badge_id, progress, unlocked, updated_at)
             VALUES (?1, ?2, ?3, 0, 0, ?4)",
            params![
                Uuid::new_v4().to_string(),
                user_id.to_string(),
                badge_id,
                now.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_badge(&self, badge_id: &str) -> Result<Option<Badge>, BadgeError> {
        let conn = self.db.connection();
        conn.query_row(
            "SELECT id, name, description, emoji, condition_kind, target, points_reward
             FROM badges WHERE id = ?1",
            params![badge_id],
            parse_badge_row,
        )
        .optional()
        .map_err(BadgeError::from)
    }

    fn badges_with_condition(&self, condition: BadgeCondition) -> Result<Vec<Badge>, BadgeError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, emoji, condition_kind, target, points_reward
             FROM badges WHERE condition_kind = ?1",
        )?;

        let rows = stmt.query_map(params![condition.as_str()], parse_badge_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(BadgeError::from)
    }
}

/// Parse a database row into a Badge.
fn parse_badge_row(row: &rusqlite::Row) -> rusqlite::Result<Badge> {
    let condition_str: String = row.get(4)?;

    Ok(Badge {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        emoji: row.get(3)?,
        condition: BadgeCondition::from_str(&condition_str)
            .unwrap_or(BadgeCondition::ReviewCount),
        target: row.get(5)?,
        points_reward: row.get(6)?,
    })
}

/// Badge engine errors.
#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("Unknown badge: {0}")]
    UnknownBadge(String),

    #[error("Points error: {0}")]
    PointsError(#[from] PointsError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
