//! Leveling policies.
//!
//! The platform carries two divergent leveling concepts: a numeric level
//! derived from cumulative points (used by match rewards and ranking
//! weights) and a named tier (used for reward-catalog eligibility). They are
//! deliberately not unified; each consumer selects its policy.

use serde::{Deserialize, Serialize};

/// Maps a cumulative point total to a level.
pub trait LevelPolicy {
    /// Numeric rank used for ordering and reward math.
    fn level_for(&self, total_points: i64) -> u32;

    /// Display name for the level.
    fn level_name(&self, total_points: i64) -> String;
}

/// Numeric leveling: one level per fixed block of points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointsPerLevel {
    pub points_per_level: i64,
}

impl Default for PointsPerLevel {
    fn default() -> Self {
        Self {
            points_per_level: 100,
        }
    }
}

impl LevelPolicy for PointsPerLevel {
    fn level_for(&self, total_points: i64) -> u32 {
        if total_points <= 0 || self.points_per_level <= 0 {
            return 0;
        }
        (total_points / self.points_per_level) as u32
    }

    fn level_name(&self, total_points: i64) -> String {
        format!("Level {}", self.level_for(total_points))
    }
}

/// Named fan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanTier {
    BurgerFan,
    BurgerLover,
    BurgerObsessed,
}

impl FanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanTier::BurgerFan => "burger_fan",
            FanTier::BurgerLover => "burger_lover",
            FanTier::BurgerObsessed => "burger_obsessed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "burger_fan" => Some(FanTier::BurgerFan),
            "burger_lover" => Some(FanTier::BurgerLover),
            "burger_obsessed" => Some(FanTier::BurgerObsessed),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FanTier::BurgerFan => "Burger Fan",
            FanTier::BurgerLover => "Burger Lover",
            FanTier::BurgerObsessed => "Burger Obsessed",
        }
    }
}

/// Tiered leveling keyed by cumulative point thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NamedTiers {
    /// Points at which a user becomes a Burger Lover.
    pub lover_at: i64,
    /// Points at which a user becomes Burger Obsessed.
    pub obsessed_at: i64,
}

impl Default for NamedTiers {
    fn default() -> Self {
        Self {
            lover_at: 500,
            obsessed_at: 2000,
        }
    }
}

impl NamedTiers {
    /// Tier for a cumulative point total.
    pub fn tier_for(&self, total_points: i64) -> FanTier {
        if total_points >= self.obsessed_at {
            FanTier::BurgerObsessed
        } else if total_points >= self.lover_at {
            FanTier::BurgerLover
        } else {
            FanTier::BurgerFan
        }
    }
}

impl LevelPolicy for NamedTiers {
    fn level_for(&self, total_points: i64) -> u32 {
        match self.tier_for(total_points) {
            FanTier::BurgerFan => 0,
            FanTier::BurgerLover => 1,
            FanTier::BurgerObsessed => 2,
        }
    }

    fn level_name(&self, total_points: i64) -> String {
        self.tier_for(total_points).display_name().to_string()
    }
}
