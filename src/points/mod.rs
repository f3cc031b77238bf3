//! Points ledger and leveling policies.

pub mod ledger;
pub mod levels;

pub use ledger::{PointsBalance, PointsError, PointsLedger, PointsReason};
pub use levels::{FanTier, LevelPolicy, NamedTiers, PointsPerLevel};
