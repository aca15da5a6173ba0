//! Rating update algorithms.
//!
//! Every algorithm is a pure function of its [`RatingInput`]. Ladders pick one
//! by name through the [`AlgorithmRegistry`], which only knows the builders
//! registered at compile time.

pub mod fide;
pub mod fixed_increment;
pub mod registry;

use rust_decimal::Decimal;

use crate::models::GameResult;

pub use fide::{FideLike, FideParams};
pub use fixed_increment::{FixedIncrement, FixedIncrementParams};
pub use registry::AlgorithmRegistry;

/// Fractional digits kept on stored ratings.
pub const RATING_SCALE: u32 = 3;

/// Largest magnitude a stored rating column can hold.
pub const MAX_RATING: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, RATING_SCALE);

/// Upper bound on any per-game adjustment an algorithm may be configured with.
pub const MAX_ADJUSTMENT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Whether `rating` fits the stored rating column.
pub fn is_storable(rating: Decimal) -> bool {
    rating.abs() <= MAX_RATING
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingInput {
    pub white: Decimal,
    pub black: Decimal,
    pub result: GameResult,
    /// Games each player had on the ladder before this one.
    pub white_games: i64,
    pub black_games: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPair {
    pub white: Decimal,
    pub black: Decimal,
}

impl RatingPair {
    pub fn new(white: Decimal, black: Decimal) -> Self {
        Self {
            white: white.round_dp(RATING_SCALE),
            black: black.round_dp(RATING_SCALE),
        }
    }

    pub fn is_storable(&self) -> bool {
        is_storable(self.white) && is_storable(self.black)
    }
}

pub trait RatingAlgorithm: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn compute(&self, input: &RatingInput) -> RatingPair;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storable_range_matches_the_rating_column() {
        assert_eq!(MAX_RATING.to_string(), "9999999.999");
        assert!(is_storable(MAX_RATING));
        assert!(is_storable(-MAX_RATING));
        assert!(!is_storable(Decimal::from(10_000_000)));
        assert!(!RatingPair::new(Decimal::from(1200), Decimal::from(-10_000_000)).is_storable());
    }
}
