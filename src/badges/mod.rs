//! Badge catalog and progression engine.

pub mod engine;
pub mod types;

pub use engine::{BadgeEngine, BadgeError};
pub use types::{default_badges, Badge, BadgeCondition, BadgeStatus, GameEvent, UnlockedBadge};
