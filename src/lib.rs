//! BurgerRank - Reputation & Ranking Engine
//!
//! The scoring core of a social burger rating platform: rating ingestion
//! with burger aggregates, pairwise ELO comparisons, a points/leveling
//! ledger, badge progression, and a composite ranking score combining all
//! of those signals.

pub mod badges;
pub mod matches;
pub mod notifications;
pub mod points;
pub mod ranking;
pub mod ratings;
pub mod storage;

// Re-export commonly used types
pub use badges::BadgeEngine;
pub use matches::MatchEngine;
pub use notifications::{Notification, Notifier};
pub use points::PointsLedger;
pub use ranking::RankingScorer;
pub use ratings::RatingService;
pub use storage::{Database, EngineConfig};
