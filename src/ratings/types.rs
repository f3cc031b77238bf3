//! Core types for ratings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted comment length.
pub const MAX_COMMENT_LEN: usize = 1000;

/// How the burger was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionType {
    Local,
    Delivery,
}

impl ConsumptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionType::Local => "local",
            ConsumptionType::Delivery => "delivery",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(ConsumptionType::Local),
            "delivery" => Some(ConsumptionType::Delivery),
            _ => None,
        }
    }
}

/// Rating fields supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingInput {
    /// Overall stars, 1-5.
    pub overall_rating: u8,
    /// Optional sub-ratings, 1-3 each.
    pub bread: Option<u8>,
    pub meat: Option<u8>,
    pub toppings: Option<u8>,
    pub sauce: Option<u8>,
    /// Whether a purchase ticket backs this rating.
    pub has_ticket: bool,
    pub ticket_url: Option<String>,
    pub price: Option<f64>,
    pub comment: Option<String>,
    pub consumption_type: Option<ConsumptionType>,
    pub appetizers: Vec<String>,
}

/// A persisted rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub burger_id: Uuid,
    pub overall_rating: u8,
    pub bread: Option<u8>,
    pub meat: Option<u8>,
    pub toppings: Option<u8>,
    pub sauce: Option<u8>,
    pub has_ticket: bool,
    pub ticket_url: Option<String>,
    pub price: Option<f64>,
    pub comment: Option<String>,
    pub consumption_type: Option<ConsumptionType>,
    pub appetizers: Vec<String>,
    /// Immutable record of the points granted for this rating.
    pub points_awarded: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of creating a rating.
#[derive(Debug, Clone)]
pub struct RatingOutcome {
    pub rating: Rating,
    pub points_earned: i64,
    pub new_total: i64,
    pub new_badges: Vec<crate::badges::UnlockedBadge>,
}

/// Result of editing a rating.
#[derive(Debug, Clone)]
pub struct RatingUpdateOutcome {
    pub rating: Rating,
    pub points_diff: i64,
    pub new_total: i64,
}

/// Points granted for a rating. Only ticket-backed ratings earn points:
/// one base point plus a bonus that scales with the star rating.
pub fn rating_points(overall_rating: u8, has_ticket: bool) -> i64 {
    if !has_ticket {
        return 0;
    }

    let bonus = match overall_rating {
        5 => 5,
        4 => 3,
        3 => 1,
        _ => 0,
    };

    1 + bonus
}
