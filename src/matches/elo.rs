//! ELO rating math.
//!
//! Standard logistic expected-outcome formula with a fixed K-factor per
//! update. Burgers that have never entered a match get an initial score
//! derived from a star-rating baseline.

use serde::{Deserialize, Serialize};

/// ELO tuning knobs. Defaults are pending product confirmation, so they are
/// configuration rather than constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EloConfig {
    /// Maximum rating swing per update.
    pub k_factor: f64,
    /// Base of the star-to-initial-score mapping.
    pub initial_base: f64,
    /// Score added per star in the initial mapping.
    pub initial_per_star: f64,
    /// Star rating assumed for a burger with no history.
    pub assumed_star_baseline: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            initial_base: 800.0,
            initial_per_star: 100.0,
            assumed_star_baseline: 4.0,
        }
    }
}

impl EloConfig {
    /// Initial score for a burger with the given star rating.
    pub fn initial_score(&self, stars: f64) -> f64 {
        self.initial_base + self.initial_per_star * stars
    }

    /// Initial score for a burger with no rating history.
    pub fn default_score(&self) -> f64 {
        self.initial_score(self.assumed_star_baseline)
    }
}

/// Expected score of the first player against the second.
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
}

/// New ratings for both sides after one match. Zero-sum: what A gains,
/// B loses.
pub fn rate_pair(rating_a: f64, rating_b: f64, a_won: bool, k: f64) -> (f64, f64) {
    let expected_a = expected_score(rating_a, rating_b);
    let actual_a = if a_won { 1.0 } else { 0.0 };
    let delta = k * (actual_a - expected_a);
    (rating_a + delta, rating_b - delta)
}
