//! Pairwise burger comparisons and ELO scoring.

pub mod elo;
pub mod engine;

pub use elo::EloConfig;
pub use engine::{MatchCandidate, MatchEngine, MatchError, MatchOutcome, MatchPair, RewardConfig};
