//! How a game result moves the two players within the rank order.

use uuid::Uuid;

use crate::error::LadderResult;
use crate::models::GameResult;
use crate::rank_table::RankTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankAdjustment {
    Keep,
    MoveAbove { mover: Uuid, anchor: Uuid },
    MoveBelow { mover: Uuid, anchor: Uuid },
}

/// Decide the adjustment from both ranks at the time of the game.
///
/// Lower rank numbers are better. A winner never stays below the loser; a draw
/// only lifts the lower player to sit directly under the higher one.
pub fn rank_adjustment(
    white: (Uuid, i32),
    black: (Uuid, i32),
    result: GameResult,
) -> RankAdjustment {
    let (white_id, white_rank) = white;
    let (black_id, black_rank) = black;
    let white_better = white_rank <= black_rank;

    match (result, white_better) {
        (GameResult::WhiteWins, true) => RankAdjustment::Keep,
        (GameResult::WhiteWins, false) => RankAdjustment::MoveAbove {
            mover: white_id,
            anchor: black_id,
        },
        (GameResult::BlackWins, true) => RankAdjustment::MoveAbove {
            mover: black_id,
            anchor: white_id,
        },
        (GameResult::BlackWins, false) => RankAdjustment::Keep,
        (GameResult::Draw, true) => RankAdjustment::Keep,
        (GameResult::Draw, false) => RankAdjustment::MoveBelow {
            mover: white_id,
            anchor: black_id,
        },
    }
}

/// Apply the adjustment for a game between two active players.
pub fn apply_result(
    table: &mut RankTable,
    white_id: Uuid,
    black_id: Uuid,
    result: GameResult,
) -> LadderResult<RankAdjustment> {
    let white_rank = table.rank_of(white_id).unwrap_or(i32::MAX);
    let black_rank = table.rank_of(black_id).unwrap_or(i32::MAX);
    let adjustment = rank_adjustment((white_id, white_rank), (black_id, black_rank), result);

    match adjustment {
        RankAdjustment::Keep => {}
        RankAdjustment::MoveAbove { mover, anchor } => table.insert_adjacent(mover, anchor, true)?,
        RankAdjustment::MoveBelow { mover, anchor } => table.insert_adjacent(mover, anchor, false)?,
    }

    Ok(adjustment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder(size: usize) -> (RankTable, Vec<Uuid>) {
        let ids: Vec<Uuid> = (0..size).map(|_| Uuid::new_v4()).collect();
        let mut table = RankTable::new();
        for id in &ids {
            table.join(*id).unwrap();
        }
        (table, ids)
    }

    #[test]
    fn decision_table() {
        let (w, b) = (Uuid::new_v4(), Uuid::new_v4());
        let better = ((w, 1), (b, 2));
        let worse = ((w, 2), (b, 1));

        assert_eq!(rank_adjustment(better.0, better.1, GameResult::WhiteWins), RankAdjustment::Keep);
        assert_eq!(
            rank_adjustment(worse.0, worse.1, GameResult::WhiteWins),
            RankAdjustment::MoveAbove { mover: w, anchor: b }
        );
        assert_eq!(
            rank_adjustment(better.0, better.1, GameResult::BlackWins),
            RankAdjustment::MoveAbove { mover: b, anchor: w }
        );
        assert_eq!(rank_adjustment(worse.0, worse.1, GameResult::BlackWins), RankAdjustment::Keep);
        assert_eq!(rank_adjustment(better.0, better.1, GameResult::Draw), RankAdjustment::Keep);
        assert_eq!(
            rank_adjustment(worse.0, worse.1, GameResult::Draw),
            RankAdjustment::MoveBelow { mover: w, anchor: b }
        );
    }

    #[test]
    fn third_beats_first() {
        let (mut table, ids) = ladder(4);

        apply_result(&mut table, ids[2], ids[0], GameResult::WhiteWins).unwrap();

        assert_eq!(table.rank_of(ids[2]), Some(1));
        assert_eq!(table.rank_of(ids[0]), Some(2));
        assert_eq!(table.rank_of(ids[1]), Some(3));
        assert_eq!(table.rank_of(ids[3]), Some(4));
    }

    #[test]
    fn underdog_black_win_climbs_above_white() {
        let (mut table, ids) = ladder(5);

        apply_result(&mut table, ids[1], ids[4], GameResult::BlackWins).unwrap();

        assert_eq!(table.ordered(), &[ids[0], ids[4], ids[1], ids[2], ids[3]]);
    }

    #[test]
    fn adjacent_draw_keeps_order() {
        let (mut table, ids) = ladder(6);

        let adjustment = apply_result(&mut table, ids[3], ids[4], GameResult::Draw).unwrap();

        assert_eq!(adjustment, RankAdjustment::Keep);
        assert_eq!(table.rank_of(ids[3]), Some(4));
        assert_eq!(table.rank_of(ids[4]), Some(5));
    }

    #[test]
    fn draw_lifts_lower_white_under_black() {
        let (mut table, ids) = ladder(6);

        apply_result(&mut table, ids[5], ids[1], GameResult::Draw).unwrap();

        assert_eq!(table.ordered(), &[ids[0], ids[1], ids[5], ids[2], ids[3], ids[4]]);
    }
}
