//! Rating ingestion service.
//!
//! Validates and records ratings, keeps the burger aggregate in step with
//! the live rating set, feeds the points ledger, and fans events out to the
//! badge engine. The side effects are ordered and independently retryable:
//! the rating write commits first, then points, then badge bookkeeping.
//! A badge failure never rolls back or fails the rating.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use super::types::{
    rating_points, ConsumptionType, Rating, RatingInput, RatingOutcome, RatingUpdateOutcome,
    MAX_COMMENT_LEN,
};
use crate::badges::{BadgeEngine, GameEvent};
use crate::points::{PointsError, PointsLedger, PointsReason};
use crate::storage::{BurgerStore, Database, StoreError};

/// Rating ingestion service.
pub struct RatingService {
    db: Arc<Database>,
    ledger: PointsLedger,
    badges: BadgeEngine,
}

impl RatingService {
    /// Create a new rating service.
    pub fn new(db: Arc<Database>, ledger: PointsLedger, badges: BadgeEngine) -> Self {
        Self { db, ledger, badges }
    }

    /// Record a new rating for a burger.
    ///
    /// A user rates a burger at most once: if a live rating already exists,
    /// this fails with [`RatingError::AlreadyRated`] carrying the existing
    /// record so the caller can redirect to the edit flow.
    pub fn create_rating(
        &self,
        user_id: Uuid,
        burger_id: Uuid,
        input: RatingInput,
    ) -> Result<RatingOutcome, RatingError> {
        validate(&input)?;

        let points = rating_points(input.overall_rating, input.has_ticket);
        let now = Utc::now();
        let rating_id = Uuid::new_v4();

        {
            let mut conn = self.db.connection();
            let tx = conn.transaction()?;

            let burger_known: bool = {
                let mut stmt = tx.prepare("SELECT 1 FROM burgers WHERE id = ?1")?;
                stmt.exists(params![burger_id.to_string()])?
            };
            if !burger_known {
                return Err(RatingError::UnknownBurger(burger_id));
            }

            if let Some(existing) = Self::live_rating(&tx, user_id, burger_id)? {
                return Err(RatingError::AlreadyRated(Box::new(existing)));
            }

            let appetizers_json = encode_appetizers(&input.appetizers)?;
            tx.execute(
                "INSERT INTO ratings
                 (id, user_id, burger_id, overall_rating, bread, meat, toppings, sauce,
                  has_ticket, ticket_url, price, comment, consumption_type, appetizers_json,
                  points_awarded, deleted, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 0, ?16, ?16)",
                params![
                    rating_id.to_string(),
                    user_id.to_string(),
                    burger_id.to_string(),
                    input.overall_rating,
                    input.bread,
                    input.meat,
                    input.toppings,
                    input.sauce,
                    input.has_ticket,
                    input.ticket_url,
                    input.price,
                    input.comment,
                    input.consumption_type.map(|c| c.as_str()),
                    appetizers_json,
                    points,
                    now.to_rfc3339(),
                ],
            )?;

            BurgerStore::new(&tx).recompute_aggregates(burger_id)?;
            tx.commit()?;
        }

        let new_total = if points > 0 {
            self.ledger
                .credit(user_id, points, PointsReason::RatingReward)?
                .total
        } else {
            self.ledger.balance(user_id)?.total
        };

        let new_badges = match self.badges.handle_event(user_id, &GameEvent::ReviewSubmitted) {
            Ok(unlocked) => unlocked,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "badge check after rating failed");
                Vec::new()
            }
        };

        let rating = Rating {
            id: rating_id,
            user_id,
            burger_id,
            overall_rating: input.overall_rating,
            bread: input.bread,
            meat: input.meat,
            toppings: input.toppings,
            sauce: input.sauce,
            has_ticket: input.has_ticket,
            ticket_url: input.ticket_url,
            price: input.price,
            comment: input.comment,
            consumption_type: input.consumption_type,
            appetizers: input.appetizers,
            points_awarded: points,
            created_at: now,
            updated_at: now,
        };

        Ok(RatingOutcome {
            rating,
            points_earned: points,
            new_total,
            new_badges,
        })
    }

    /// Edit an existing rating in place.
    ///
    /// Points are recomputed with the same formula and the difference
    /// (possibly negative) is applied as a correction. The burger aggregate
    /// is recomputed from scratch.
    pub fn update_rating(
        &self,
        user_id: Uuid,
        rating_id: Uuid,
        input: RatingInput,
    ) -> Result<RatingUpdateOutcome, RatingError> {
        validate(&input)?;

        let new_points = rating_points(input.overall_rating, input.has_ticket);
        let now = Utc::now();

        let (existing, points_diff) = {
            let mut conn = self.db.connection();
            let tx = conn.transaction()?;

            let existing = Self::get_rating(&tx, rating_id)?
                .ok_or(RatingError::NotFound(rating_id))?;
            if existing.user_id != user_id {
                return Err(RatingError::NotOwner);
            }

            let appetizers_json = encode_appetizers(&input.appetizers)?;
            tx.execute(
                "UPDATE ratings SET
                     overall_rating = ?2, bread = ?3, meat = ?4, toppings = ?5, sauce = ?6,
                     has_ticket = ?7, ticket_url = ?8, price = ?9, comment = ?10,
                     consumption_type = ?11, appetizers_json = ?12, points_awarded = ?13,
                     updated_at = ?14
                 WHERE id = ?1",
                params![
                    rating_id.to_string(),
                    input.overall_rating,
                    input.bread,
                    input.meat,
                    input.toppings,
                    input.sauce,
                    input.has_ticket,
                    input.ticket_url,
                    input.price,
                    input.comment,
                    input.consumption_type.map(|c| c.as_str()),
                    appetizers_json,
                    new_points,
                    now.to_rfc3339(),
                ],
            )?;

            BurgerStore::new(&tx).recompute_aggregates(existing.burger_id)?;
            tx.commit()?;

            let diff = new_points - existing.points_awarded;
            (existing, diff)
        };

        let new_total = if points_diff != 0 {
            self.ledger.apply_correction(user_id, points_diff)?.total
        } else {
            self.ledger.balance(user_id)?.total
        };

        // Badge progress is recomputed from current stats, so re-firing the
        // event cannot double-award anything
        if let Err(e) = self.badges.handle_event(user_id, &GameEvent::RatingGiven) {
            tracing::warn!(%user_id, error = %e, "badge refresh after rating edit failed");
        }

        let rating = Rating {
            overall_rating: input.overall_rating,
            bread: input.bread,
            meat: input.meat,
            toppings: input.toppings,
            sauce: input.sauce,
            has_ticket: input.has_ticket,
            ticket_url: input.ticket_url,
            price: input.price,
            comment: input.comment,
            consumption_type: input.consumption_type,
            appetizers: input.appetizers,
            points_awarded: new_points,
            updated_at: now,
            ..existing
        };

        Ok(RatingUpdateOutcome {
            rating,
            points_diff,
            new_total,
        })
    }

    /// Logically delete a rating and recompute the burger aggregate.
    /// Used by the moderation path; awarded points are not clawed back.
    pub fn remove_rating(&self, rating_id: Uuid) -> Result<(), RatingError> {
        let mut conn = self.db.connection();
        let tx = conn.transaction()?;

        let existing =
            Self::get_rating(&tx, rating_id)?.ok_or(RatingError::NotFound(rating_id))?;

        tx.execute(
            "UPDATE ratings SET deleted = 1, updated_at = ?2 WHERE id = ?1",
            params![rating_id.to_string(), Utc::now().to_rfc3339()],
        )?;

        BurgerStore::new(&tx).recompute_aggregates(existing.burger_id)?;
        tx.commit()?;

        Ok(())
    }

    /// A user's live rating for a burger, if any.
    pub fn rating_for(
        &self,
        user_id: Uuid,
        burger_id: Uuid,
    ) -> Result<Option<Rating>, RatingError> {
        let conn = self.db.connection();
        Self::live_rating(&conn, user_id, burger_id)
    }

    fn live_rating(
        conn: &rusqlite::Connection,
        user_id: Uuid,
        burger_id: Uuid,
    ) -> Result<Option<Rating>, RatingError> {
        conn.query_row(
            &format!("{RATING_SELECT} WHERE user_id = ?1 AND burger_id = ?2 AND deleted = 0"),
            params![user_id.to_string(), burger_id.to_string()],
            parse_rating_row,
        )
        .optional()
        .map_err(RatingError::from)
    }

    fn get_rating(
        conn: &rusqlite::Connection,
        rating_id: Uuid,
    ) -> Result<Option<Rating>, RatingError> {
        conn.query_row(
            &format!("{RATING_SELECT} WHERE id = ?1 AND deleted = 0"),
            params![rating_id.to_string()],
            parse_rating_row,
        )
        .optional()
        .map_err(RatingError::from)
    }
}

const RATING_SELECT: &str = "SELECT id, user_id, burger_id, overall_rating, bread, meat, \
     toppings, sauce, has_ticket, ticket_url, price, comment, consumption_type, \
     appetizers_json, points_awarded, created_at, updated_at FROM ratings";

fn validate(input: &RatingInput) -> Result<(), RatingError> {
    if !(1..=5).contains(&input.overall_rating) {
        return Err(RatingError::ValidationError(format!(
            "overall_rating must be 1-5, got {}",
            input.overall_rating
        )));
    }

    for (name, value) in [
        ("bread", input.bread),
        ("meat", input.meat),
        ("toppings", input.toppings),
        ("sauce", input.sauce),
    ] {
        if let Some(v) = value {
            if !(1..=3).contains(&v) {
                return Err(RatingError::ValidationError(format!(
                    "{name} must be 1-3, got {v}"
                )));
            }
        }
    }

    if let Some(comment) = &input.comment {
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(RatingError::ValidationError(format!(
                "comment exceeds {MAX_COMMENT_LEN} characters"
            )));
        }
    }

    if let Some(price) = input.price {
        if price < 0.0 {
            return Err(RatingError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }
    }

    Ok(())
}

fn encode_appetizers(appetizers: &[String]) -> Result<Option<String>, serde_json::Error> {
    if appetizers.is_empty() {
        Ok(None)
    } else {
        serde_json::to_string(appetizers).map(Some)
    }
}

/// Parse a database row into a Rating.
fn parse_rating_row(row: &rusqlite::Row) -> rusqlite::Result<Rating> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let burger_id_str: String = row.get(2)?;
    let consumption_str: Option<String> = row.get(12)?;
    let appetizers_json: Option<String> = row.get(13)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    Ok(Rating {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        user_id: Uuid::parse_str(&user_id_str).unwrap_or_default(),
        burger_id: Uuid::parse_str(&burger_id_str).unwrap_or_default(),
        overall_rating: row.get(3)?,
        bread: row.get(4)?,
        meat: row.get(5)?,
        toppings: row.get(6)?,
        sauce: row.get(7)?,
        has_ticket: row.get(8)?,
        ticket_url: row.get(9)?,
        price: row.get(10)?,
        comment: row.get(11)?,
        consumption_type: consumption_str.as_deref().and_then(ConsumptionType::from_str),
        appetizers: appetizers_json
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        points_awarded: row.get(14)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Rating ingestion errors.
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Burger not found: {0}")]
    UnknownBurger(Uuid),

    #[error("Rating not found: {0}")]
    NotFound(Uuid),

    #[error("Rating belongs to another user")]
    NotOwner,

    #[error("User has already rated this burger")]
    AlreadyRated(Box<Rating>),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Points error: {0}")]
    PointsError(#[from] PointsError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
