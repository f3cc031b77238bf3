//! Authoritative record of spendable vs. cumulative points per user.
//!
//! `available_points` is spendable and decremented by redemptions;
//! `total_points` is cumulative and only moves backwards through rating-edit
//! corrections, never below zero. All mutations are single-statement SQL
//! increments so concurrent credits cannot lose updates.

use std::fmt;
use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::notifications::{Notification, Notifier};
use crate::storage::Database;

/// Why points moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsReason {
    RatingReward,
    RatingCorrection,
    MatchReward,
    BadgeReward,
    Redemption,
}

impl PointsReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsReason::RatingReward => "rating_reward",
            PointsReason::RatingCorrection => "rating_correction",
            PointsReason::MatchReward => "match_reward",
            PointsReason::BadgeReward => "badge_reward",
            PointsReason::Redemption => "redemption",
        }
    }
}

impl fmt::Display for PointsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's current point balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointsBalance {
    pub available: i64,
    pub total: i64,
}

/// Points ledger service.
#[derive(Clone)]
pub struct PointsLedger {
    db: Arc<Database>,
    notifier: Notifier,
}

impl PointsLedger {
    /// Create a new points ledger.
    pub fn new(db: Arc<Database>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// Credit points to both the spendable and cumulative balances.
    pub fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: PointsReason,
    ) -> Result<PointsBalance, PointsError> {
        if amount < 0 {
            return Err(PointsError::InvalidAmount(amount));
        }

        let balance = {
            let conn = self.db.connection();
            Self::ensure_account(&conn, user_id)?;

            conn.execute(
                "UPDATE user_points
                 SET available_points = available_points + ?1,
                     total_points = total_points + ?1
                 WHERE user_id = ?2",
                params![amount, user_id.to_string()],
            )?;

            Self::read_balance(&conn, user_id)?.unwrap_or_default()
        };

        if amount > 0 {
            tracing::debug!(%user_id, amount, reason = %reason, "points credited");
            self.notifier.notify(Notification::PointsAwarded {
                user_id,
                amount,
                reason: reason.as_str().to_string(),
            });
        }

        Ok(balance)
    }

    /// Debit spendable points. Fails without touching the row when the
    /// balance is insufficient; `total_points` is unaffected.
    pub fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: PointsReason,
    ) -> Result<PointsBalance, PointsError> {
        if amount < 0 {
            return Err(PointsError::InvalidAmount(amount));
        }

        let conn = self.db.connection();
        Self::ensure_account(&conn, user_id)?;

        let updated = conn.execute(
            "UPDATE user_points
             SET available_points = available_points - ?1
             WHERE user_id = ?2 AND available_points >= ?1",
            params![amount, user_id.to_string()],
        )?;

        if updated == 0 {
            let balance = Self::read_balance(&conn, user_id)?.unwrap_or_default();
            return Err(PointsError::InsufficientPoints {
                available: balance.available,
                requested: amount,
            });
        }

        tracing::debug!(%user_id, amount, reason = %reason, "points debited");
        Ok(Self::read_balance(&conn, user_id)?.unwrap_or_default())
    }

    /// Apply a rating-edit correction. The diff may be negative; both
    /// counters clamp at zero.
    pub fn apply_correction(
        &self,
        user_id: Uuid,
        diff: i64,
    ) -> Result<PointsBalance, PointsError> {
        let conn = self.db.connection();
        Self::ensure_account(&conn, user_id)?;

        conn.execute(
            "UPDATE user_points
             SET available_points = MAX(available_points + ?1, 0),
                 total_points = MAX(total_points + ?1, 0)
             WHERE user_id = ?2",
            params![diff, user_id.to_string()],
        )?;

        tracing::debug!(%user_id, diff, "points corrected");
        Ok(Self::read_balance(&conn, user_id)?.unwrap_or_default())
    }

    /// Read a user's balances. Users without a row have zero of everything.
    pub fn balance(&self, user_id: Uuid) -> Result<PointsBalance, PointsError> {
        let conn = self.db.connection();
        Ok(Self::read_balance(&conn, user_id)?.unwrap_or_default())
    }

    fn ensure_account(conn: &rusqlite::Connection, user_id: Uuid) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT OR IGNORE INTO user_points (user_id, available_points, total_points)
             VALUES (?1, 0, 0)",
            params![user_id.to_string()],
        )?;
        Ok(())
    }

    fn read_balance(
        conn: &rusqlite::Connection,
        user_id: Uuid,
    ) -> Result<Option<PointsBalance>, rusqlite::Error> {
        conn.query_row(
            "SELECT available_points, total_points FROM user_points WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| {
                Ok(PointsBalance {
                    available: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )
        .optional()
    }
}

/// Points ledger errors.
#[derive(Debug, Error)]
pub enum PointsError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Insufficient points: {available} available, {requested} requested")]
    InsufficientPoints { available: i64, requested: i64 },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
