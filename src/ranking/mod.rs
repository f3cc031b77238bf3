//! Composite ranking score.

pub mod scorer;

pub use scorer::{
    composite_score, RankingBreakdown, RankingConfig, RankingError, RankingScorer, RankingSignals,
    RankingWeights,
};
