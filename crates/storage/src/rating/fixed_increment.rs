use rust_decimal::Decimal;
use serde::Deserialize;

use super::{RatingAlgorithm, RatingInput, RatingPair};
use crate::models::GameResult;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixedIncrementParams {
    pub step: Decimal,
    pub draw_step: Decimal,
}

impl Default for FixedIncrementParams {
    fn default() -> Self {
        Self {
            step: Decimal::from(2),
            draw_step: Decimal::ONE,
        }
    }
}

/// Moves ratings by a constant step. Meant for casual and demo ladders.
#[derive(Debug, Clone, Default)]
pub struct FixedIncrement {
    params: FixedIncrementParams,
}

impl FixedIncrement {
    pub const NAME: &'static str = "fixed_increment";

    pub fn new(params: FixedIncrementParams) -> Self {
        Self { params }
    }
}

impl RatingAlgorithm for FixedIncrement {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compute(&self, input: &RatingInput) -> RatingPair {
        let FixedIncrementParams { step, draw_step } = self.params;
        let (white, black) = (input.white, input.black);

        match input.result {
            GameResult::WhiteWins => RatingPair::new(white + step, black - step),
            GameResult::BlackWins => RatingPair::new(white - step, black + step),
            GameResult::Draw if white > black => {
                RatingPair::new(white - draw_step, black + draw_step)
            }
            GameResult::Draw if white < black => {
                RatingPair::new(white + draw_step, black - draw_step)
            }
            GameResult::Draw => RatingPair::new(white, black),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(white: i64, black: i64, result: GameResult) -> (Decimal, Decimal) {
        let pair = FixedIncrement::default().compute(&RatingInput {
            white: Decimal::from(white),
            black: Decimal::from(black),
            result,
            white_games: 0,
            black_games: 0,
        });
        (pair.white, pair.black)
    }

    #[test]
    fn decisive_results_move_by_step() {
        assert_eq!(run(1200, 1250, GameResult::WhiteWins), (Decimal::from(1202), Decimal::from(1248)));
        assert_eq!(run(1200, 1250, GameResult::BlackWins), (Decimal::from(1198), Decimal::from(1252)));
    }

    #[test]
    fn draws_pull_toward_equality() {
        assert_eq!(run(1300, 1200, GameResult::Draw), (Decimal::from(1299), Decimal::from(1201)));
        assert_eq!(run(1200, 1300, GameResult::Draw), (Decimal::from(1201), Decimal::from(1299)));
        assert_eq!(run(1200, 1200, GameResult::Draw), (Decimal::from(1200), Decimal::from(1200)));
    }
}
