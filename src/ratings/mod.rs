//! Rating ingestion and aggregate maintenance.

pub mod ingest;
pub mod types;

pub use ingest::{RatingError, RatingService};
pub use types::{
    rating_points, ConsumptionType, Rating, RatingInput, RatingOutcome, RatingUpdateOutcome,
};
