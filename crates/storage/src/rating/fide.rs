use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use super::{RatingAlgorithm, RatingInput, RatingPair};

/// Upper bounds (exclusive) of the rating-difference buckets. A difference
/// below `EXPECTED_SCORE_STEPS[i]` and at least the previous bound expects a
/// score of `0.50 + i / 100`; anything from 736 up is a certain win.
const EXPECTED_SCORE_STEPS: [u32; 50] = [
    4, 11, 18, 26, 33, 40, 47, 54, 62, 69, 77, 84, 92, 99, 107, 114, 122, 130, 138, 146, 154, 163,
    171, 180, 189, 198, 207, 216, 226, 236, 246, 257, 268, 279, 291, 303, 316, 329, 345, 358, 375,
    392, 412, 433, 457, 485, 518, 560, 620, 736,
];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FideParams {
    pub provisional_k: Decimal,
    pub standard_k: Decimal,
    /// Players with at most this many prior games use `provisional_k`.
    pub provisional_limit: i64,
}

impl Default for FideParams {
    fn default() -> Self {
        Self {
            provisional_k: Decimal::from(32),
            standard_k: Decimal::from(24),
            provisional_limit: 30,
        }
    }
}

/// Table-driven Elo update in the style of the FIDE rating regulations.
#[derive(Debug, Clone, Default)]
pub struct FideLike {
    params: FideParams,
}

impl FideLike {
    pub const NAME: &'static str = "fide";

    pub fn new(params: FideParams) -> Self {
        Self { params }
    }

    fn k_factor(&self, prior_games: i64) -> Decimal {
        if prior_games <= self.params.provisional_limit {
            self.params.provisional_k
        } else {
            self.params.standard_k
        }
    }
}

/// Expected score of the higher-rated player for an absolute rating difference.
pub fn expected_score(diff: Decimal) -> Decimal {
    let diff = diff.abs().trunc().to_u32().unwrap_or(u32::MAX);
    let bucket = EXPECTED_SCORE_STEPS
        .iter()
        .take_while(|&&bound| diff >= bound)
        .count();

    Decimal::new(50 + bucket as i64, 2)
}

impl RatingAlgorithm for FideLike {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute(&self, input: &RatingInput) -> RatingPair {
        let favourite = expected_score(input.white - input.black);
        let (white_expected, black_expected) = if input.white >= input.black {
            (favourite, Decimal::ONE - favourite)
        } else {
            (Decimal::ONE - favourite, favourite)
        };

        let (white_score, black_score) = input.result.scores();
        let white_k = self.k_factor(input.white_games);
        let black_k = self.k_factor(input.black_games);

        RatingPair::new(
            input.white + white_k * (white_score - white_expected),
            input.black + black_k * (black_score - black_expected),
        )
    }
}
