//! Core types for the badge system.
//!
//! The catalog is declarative data: adding a badge is a new row, not new
//! code. Progress counters are recomputed from underlying stats on every
//! check, never incremented blindly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a badge's progress counter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCondition {
    /// Live (non-deleted) reviews written.
    ReviewCount,
    /// Live reviews with a 5-star overall rating.
    FiveStarCount,
    /// Live reviews with a 1-star overall rating.
    OneStarCount,
    /// Live reviews backed by a ticket.
    VerifiedReviewCount,
    /// Burger matches completed.
    MatchCount,
    /// Photos uploaded (stat owned by the media subsystem).
    PhotoCount,
    /// Followers gained (stat owned by the social graph).
    FollowerCount,
    /// Likes received (stat owned by the social graph).
    LikeCount,
}

impl BadgeCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCondition::ReviewCount => "review_count",
            BadgeCondition::FiveStarCount => "five_star_count",
            BadgeCondition::OneStarCount => "one_star_count",
            BadgeCondition::VerifiedReviewCount => "verified_review_count",
            BadgeCondition::MatchCount => "match_count",
            BadgeCondition::PhotoCount => "photo_count",
            BadgeCondition::FollowerCount => "follower_count",
            BadgeCondition::LikeCount => "like_count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "review_count" => Some(BadgeCondition::ReviewCount),
            "five_star_count" => Some(BadgeCondition::FiveStarCount),
            "one_star_count" => Some(BadgeCondition::OneStarCount),
            "verified_review_count" => Some(BadgeCondition::VerifiedReviewCount),
            "match_count" => Some(BadgeCondition::MatchCount),
            "photo_count" => Some(BadgeCondition::PhotoCount),
            "follower_count" => Some(BadgeCondition::FollowerCount),
            "like_count" => Some(BadgeCondition::LikeCount),
            _ => None,
        }
    }
}

/// Badge definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub condition: BadgeCondition,
    pub target: i64,
    pub points_reward: i64,
}

/// A user's standing on one badge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeStatus {
    pub badge_id: String,
    pub name: String,
    pub emoji: String,
    pub progress: i64,
    pub target: i64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// A badge freshly unlocked by an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub badge_id: String,
    pub name: String,
    pub emoji: String,
    pub points_reward: i64,
    pub unlocked_at: DateTime<Utc>,
}

/// A gameplay event that may move badge progress.
///
/// Photo, follower, and like totals are owned by out-of-scope subsystems,
/// so those events carry the current total; rating- and match-derived
/// counters are recomputed from this engine's own tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ReviewSubmitted,
    RatingGiven,
    MatchCompleted,
    PhotoAdded { total: i64 },
    FollowerAdded { total: i64 },
    LikeReceived { total: i64 },
}

impl GameEvent {
    /// Conditions whose progress this event may have moved.
    pub fn touched_conditions(&self) -> &'static [BadgeCondition] {
        match self {
            GameEvent::ReviewSubmitted | GameEvent::RatingGiven => &[
                BadgeCondition::ReviewCount,
                BadgeCondition::FiveStarCount,
                BadgeCondition::OneStarCount,
                BadgeCondition::VerifiedReviewCount,
            ],
            GameEvent::MatchCompleted => &[BadgeCondition::MatchCount],
            GameEvent::PhotoAdded { .. } => &[BadgeCondition::PhotoCount],
            GameEvent::FollowerAdded { .. } => &[BadgeCondition::FollowerCount],
            GameEvent::LikeReceived { .. } => &[BadgeCondition::LikeCount],
        }
    }

    /// Externally-supplied progress total, if this event carries one.
    pub fn external_total(&self) -> Option<i64> {
        match self {
            GameEvent::PhotoAdded { total }
            | GameEvent::FollowerAdded { total }
            | GameEvent::LikeReceived { total } => Some(*total),
            _ => None,
        }
    }
}

/// Default badge catalog.
pub fn default_badges() -> Vec<Badge> {
    vec![
        Badge {
            id: "first_bite".to_string(),
            name: "First Bite".to_string(),
            description: "Write your first review".to_string(),
            emoji: "🍔".to_string(),
            condition: BadgeCondition::ReviewCount,
            target: 1,
            points_reward: 10,
        },
        Badge {
            id: "regular".to_string(),
            name: "Regular".to_string(),
            description: "Write 10 reviews".to_string(),
            emoji: "🍟".to_string(),
            condition: BadgeCondition::ReviewCount,
            target: 10,
            points_reward: 25,
        },
        Badge {
            id: "critic".to_string(),
            name: "Critic".to_string(),
            description: "Write 50 reviews".to_string(),
            emoji: "📝".to_string(),
            condition: BadgeCondition::ReviewCount,
            target: 50,
            points_reward: 100,
        },
        Badge {
            id: "burger_century".to_string(),
            name: "Burger Century".to_string(),
            description: "Write 100 reviews".to_string(),
            emoji: "💯".to_string(),
            condition: BadgeCondition::ReviewCount,
            target: 100,
            points_reward: 250,
        },
        Badge {
            id: "five_star_fan".to_string(),
            name: "Five Star Fan".to_string(),
            description: "Hand out 10 five-star ratings".to_string(),
            emoji: "⭐".to_string(),
            condition: BadgeCondition::FiveStarCount,
            target: 10,
            points_reward: 30,
        },
        Badge {
            id: "tough_crowd".to_string(),
            name: "Tough Crowd".to_string(),
            description: "Hand out 10 one-star ratings".to_string(),
            emoji: "🌶️".to_string(),
            condition: BadgeCondition::OneStarCount,
            target: 10,
            points_reward: 30,
        },
        Badge {
            id: "ticket_collector".to_string(),
            name: "Ticket Collector".to_string(),
            description: "Write 25 ticket-verified reviews".to_string(),
            emoji: "🎫".to_string(),
            condition: BadgeCondition::VerifiedReviewCount,
            target: 25,
            points_reward: 75,
        },
        Badge {
            id: "matchmaker".to_string(),
            name: "Matchmaker".to_string(),
            description: "Complete 10 burger matches".to_string(),
            emoji: "⚔️".to_string(),
            condition: BadgeCondition::MatchCount,
            target: 10,
            points_reward: 20,
        },
        Badge {
            id: "duelist".to_string(),
            name: "Duelist".to_string(),
            description: "Complete 100 burger matches".to_string(),
            emoji: "🏆".to_string(),
            condition: BadgeCondition::MatchCount,
            target: 100,
            points_reward: 100,
        },
        Badge {
            id: "shutterbug".to_string(),
            name: "Shutterbug".to_string(),
            description: "Upload 10 burger photos".to_string(),
            emoji: "📸".to_string(),
            condition: BadgeCondition::PhotoCount,
            target: 10,
            points_reward: 25,
        },
        Badge {
            id: "crowd_favorite".to_string(),
            name: "Crowd Favorite".to_string(),
            description: "Reach 25 followers".to_string(),
            emoji: "🤝".to_string(),
            condition: BadgeCondition::FollowerCount,
            target: 25,
            points_reward: 50,
        },
        Badge {
            id: "influencer".to_string(),
            name: "Influencer".to_string(),
            description: "Reach 100 followers".to_string(),
            emoji: "👑".to_string(),
            condition: BadgeCondition::FollowerCount,
            target: 100,
            points_reward: 150,
        },
        Badge {
            id: "well_liked".to_string(),
            name: "Well Liked".to_string(),
            description: "Receive 50 likes on your reviews".to_string(),
            emoji: "❤️".to_string(),
            condition: BadgeCondition::LikeCount,
            target: 50,
            points_reward: 50,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let badges = default_badges();
        let ids: HashSet<_> = badges.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids.len(), badges.len());
    }

    #[test]
    fn test_catalog_targets_and_rewards_positive() {
        for badge in default_badges() {
            assert!(badge.target > 0, "badge {} has zero target", badge.id);
            assert!(
                badge.points_reward > 0,
                "badge {} has zero reward",
                badge.id
            );
        }
    }

    #[test]
    fn test_condition_string_round_trip() {
        for badge in default_badges() {
            let s = badge.condition.as_str();
            assert_eq!(BadgeCondition::from_str(s), Some(badge.condition));
        }
    }

    #[test]
    fn test_review_event_touches_rating_conditions() {
        let touched = GameEvent::ReviewSubmitted.touched_conditions();
        assert!(touched.contains(&BadgeCondition::ReviewCount));
        assert!(touched.contains(&BadgeCondition::FiveStarCount));
        assert!(!touched.contains(&BadgeCondition::MatchCount));
    }

    #[test]
    fn test_external_totals() {
        assert_eq!(GameEvent::PhotoAdded { total: 7 }.external_total(), Some(7));
        assert_eq!(GameEvent::ReviewSubmitted.external_total(), None);
    }
}
