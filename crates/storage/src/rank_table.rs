//! Dense rank order of one ladder.
//!
//! Active members live in `order`, where index `i` holds rank `i + 1`, so the
//! 1..N invariant holds by construction. Every operation edits the vector and
//! the caller persists [`RankTable::changed_rows`] in a single batch.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{LadderError, LadderResult};
use crate::models::Ranking;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankTable {
    order: Vec<Uuid>,
    inactive: HashSet<Uuid>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from stored rows, rejecting anything that breaks density.
    pub fn from_rankings(rows: &[Ranking]) -> LadderResult<Self> {
        let mut slots: Vec<Option<Uuid>> = Vec::new();
        let mut inactive = HashSet::new();
        let active_count = rows.iter().filter(|row| row.is_active).count();
        slots.resize(active_count, None);

        for row in rows {
            match (row.is_active, row.rank) {
                (false, None) => {
                    inactive.insert(row.player_id);
                }
                (false, Some(rank)) => {
                    return Err(LadderError::consistency(format!(
                        "inactive player {} still holds rank {rank}",
                        row.player_id
                    )));
                }
                (true, None) => {
                    return Err(LadderError::consistency(format!(
                        "active player {} has no rank",
                        row.player_id
                    )));
                }
                (true, Some(rank)) => {
                    let slot = usize::try_from(rank)
                        .ok()
                        .filter(|&rank| (1..=active_count).contains(&rank))
                        .ok_or_else(|| {
                            LadderError::consistency(format!(
                                "rank {rank} of player {} is outside 1..={active_count}",
                                row.player_id
                            ))
                        })?;
                    if let Some(holder) = slots[slot - 1].replace(row.player_id) {
                        return Err(LadderError::consistency(format!(
                            "rank {rank} held by both {holder} and {}",
                            row.player_id
                        )));
                    }
                }
            }
        }

        // Every slot is filled: `active_count` distinct ranks within 1..=active_count.
        let order = slots.into_iter().flatten().collect();
        Ok(Self { order, inactive })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, player_id: Uuid) -> bool {
        self.is_active(player_id) || self.inactive.contains(&player_id)
    }

    pub fn is_active(&self, player_id: Uuid) -> bool {
        self.position(player_id).is_some()
    }

    pub fn rank_of(&self, player_id: Uuid) -> Option<i32> {
        self.position(player_id).map(to_rank)
    }

    /// The active player directly below `player_id`, if any.
    pub fn below(&self, player_id: Uuid) -> Option<Uuid> {
        let index = self.position(player_id)?;
        self.order.get(index + 1).copied()
    }

    /// Active players, best first.
    pub fn ordered(&self) -> &[Uuid] {
        &self.order
    }

    /// Add a brand new member at the bottom.
    pub fn join(&mut self, player_id: Uuid) -> LadderResult<i32> {
        if self.contains(player_id) {
            return Err(LadderError::validation(format!(
                "player {player_id} already holds a ranking on this ladder"
            )));
        }
        self.order.push(player_id);
        Ok(to_rank(self.order.len() - 1))
    }

    /// Take the player out of the order and close the gap below them.
    pub fn remove(&mut self, player_id: Uuid) -> LadderResult<()> {
        let Some(index) = self.position(player_id) else {
            return Err(if self.inactive.contains(&player_id) {
                LadderError::invalid_state(format!("player {player_id} is already inactive"))
            } else {
                LadderError::invalid_state(format!("player {player_id} has no ranking"))
            });
        };
        self.order.remove(index);
        self.inactive.insert(player_id);
        Ok(())
    }

    /// Bring an inactive member back in at the bottom.
    pub fn rejoin(&mut self, player_id: Uuid) -> LadderResult<i32> {
        if self.is_active(player_id) {
            return Err(LadderError::invalid_state(format!(
                "player {player_id} is already active"
            )));
        }
        if !self.inactive.remove(&player_id) {
            return Err(LadderError::invalid_state(format!(
                "player {player_id} has no ranking"
            )));
        }
        self.order.push(player_id);
        Ok(to_rank(self.order.len() - 1))
    }

    /// Swap the player with the one directly below. Returns whether anything moved.
    pub fn demote_one(&mut self, player_id: Uuid) -> LadderResult<bool> {
        let index = self.active_position(player_id)?;
        if index + 1 >= self.order.len() {
            return Ok(false);
        }
        self.order.swap(index, index + 1);
        Ok(true)
    }

    /// Move `mover` so it sits directly above (or below) `anchor`; everyone
    /// between the two old positions shifts by one place.
    pub fn insert_adjacent(&mut self, mover: Uuid, anchor: Uuid, above: bool) -> LadderResult<()> {
        if mover == anchor {
            return Err(LadderError::validation("a player cannot be placed next to themselves"));
        }
        let from = self.active_position(mover)?;
        self.active_position(anchor)?;

        self.order.remove(from);
        let anchor_index = self.active_position(anchor)?;
        let target = if above { anchor_index } else { anchor_index + 1 };
        self.order.insert(target, mover);
        Ok(())
    }

    /// Rows whose rank or activity differ from `before`, updated in place.
    /// Rows coming back from inactivity restart their active stretch at `now`.
    pub fn changed_rows(&self, before: &[Ranking], now: DateTime<Utc>) -> Vec<Ranking> {
        let ranks: HashMap<Uuid, i32> = self
            .order
            .iter()
            .enumerate()
            .map(|(index, player_id)| (*player_id, to_rank(index)))
            .collect();

        before
            .iter()
            .filter_map(|row| {
                let rank = ranks.get(&row.player_id).copied();
                let is_active = rank.is_some();
                let active_since = if is_active && !row.is_active {
                    now
                } else {
                    row.active_since
                };
                (row.rank != rank || row.is_active != is_active).then(|| Ranking {
                    rank,
                    is_active,
                    active_since,
                    ..row.clone()
                })
            })
            .collect()
    }

    fn position(&self, player_id: Uuid) -> Option<usize> {
        self.order.iter().position(|id| *id == player_id)
    }

    fn active_position(&self, player_id: Uuid) -> LadderResult<usize> {
        self.position(player_id).ok_or_else(|| {
            LadderError::invalid_state(format!("player {player_id} is not ranked on this ladder"))
        })
    }
}

fn to_rank(index: usize) -> i32 {
    i32::try_from(index + 1).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::*;

    fn players(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    fn table(ids: &[Uuid]) -> RankTable {
        let mut table = RankTable::new();
        for id in ids {
            table.join(*id).unwrap();
        }
        table
    }

    fn row(player_id: Uuid, rank: Option<i32>) -> Ranking {
        Ranking {
            ranking_id: Uuid::new_v4(),
            player_id,
            ladder_id: Uuid::nil(),
            rank,
            initial_rating: Decimal::from(1200),
            is_active: rank.is_some(),
            joined_at: Utc::now(),
            active_since: Utc::now(),
        }
    }

    fn assert_dense(table: &RankTable) {
        for (index, id) in table.ordered().iter().enumerate() {
            assert_eq!(table.rank_of(*id), Some(index as i32 + 1));
        }
    }

    #[test]
    fn join_appends_at_bottom() {
        let ids = players(3);
        let mut table = RankTable::new();
        assert_eq!(table.join(ids[0]).unwrap(), 1);
        assert_eq!(table.join(ids[1]).unwrap(), 2);
        assert_eq!(table.join(ids[2]).unwrap(), 3);

        let err = table.join(ids[1]).unwrap_err();
        assert!(matches!(err, LadderError::Validation(_)));
    }

    #[test]
    fn insert_above_pulls_winner_to_top() {
        let ids = players(4);
        let mut table = table(&ids);

        table.insert_adjacent(ids[2], ids[0], true).unwrap();

        assert_eq!(table.ordered(), &[ids[2], ids[0], ids[1], ids[3]]);
        assert_dense(&table);
    }

    #[test]
    fn insert_below_stops_under_anchor() {
        let ids = players(5);
        let mut table = table(&ids);

        table.insert_adjacent(ids[4], ids[1], false).unwrap();

        assert_eq!(table.ordered(), &[ids[0], ids[1], ids[4], ids[2], ids[3]]);
        assert_dense(&table);
    }

    #[test]
    fn insert_moves_down_as_well() {
        let ids = players(4);
        let mut table = table(&ids);

        table.insert_adjacent(ids[0], ids[3], false).unwrap();

        assert_eq!(table.ordered(), &[ids[1], ids[2], ids[3], ids[0]]);
    }

    #[test]
    fn insert_requires_two_active_players() {
        let ids = players(3);
        let mut table = table(&ids);
        table.remove(ids[2]).unwrap();

        assert!(table.insert_adjacent(ids[0], ids[0], true).is_err());
        assert!(matches!(
            table.insert_adjacent(ids[2], ids[0], true),
            Err(LadderError::InvalidState(_))
        ));
        assert_eq!(table.ordered(), &[ids[0], ids[1]]);
    }

    #[test]
    fn demote_swaps_with_next() {
        let ids = players(3);
        let mut table = table(&ids);

        assert!(table.demote_one(ids[0]).unwrap());
        assert_eq!(table.ordered(), &[ids[1], ids[0], ids[2]]);

        assert!(!table.demote_one(ids[2]).unwrap());
        assert_eq!(table.ordered(), &[ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn remove_closes_gap() {
        let ids = players(5);
        let mut table = table(&ids);

        table.remove(ids[1]).unwrap();

        assert_eq!(table.rank_of(ids[1]), None);
        assert_eq!(table.rank_of(ids[2]), Some(2));
        assert_eq!(table.rank_of(ids[3]), Some(3));
        assert_eq!(table.rank_of(ids[4]), Some(4));
        assert!(table.contains(ids[1]));
        assert!(matches!(table.remove(ids[1]), Err(LadderError::InvalidState(_))));
        assert!(matches!(table.remove(Uuid::new_v4()), Err(LadderError::InvalidState(_))));
    }

    #[test]
    fn rejoin_goes_to_bottom() {
        let ids = players(8);
        let mut table = table(&ids);
        table.remove(ids[0]).unwrap();

        assert_eq!(table.len(), 7);
        assert_eq!(table.rejoin(ids[0]).unwrap(), 8);
        assert!(matches!(table.rejoin(ids[0]), Err(LadderError::InvalidState(_))));
        assert!(matches!(table.rejoin(Uuid::new_v4()), Err(LadderError::InvalidState(_))));
    }

    #[test]
    fn rejoin_on_empty_ladder_takes_first_place() {
        let ids = players(1);
        let mut table = table(&ids);
        table.remove(ids[0]).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.rejoin(ids[0]).unwrap(), 1);
    }

    #[test]
    fn loads_valid_rows_in_rank_order() {
        let ids = players(3);
        let rows = vec![
            row(ids[0], Some(3)),
            row(ids[1], None),
            row(ids[2], Some(1)),
            row(Uuid::new_v4(), Some(2)),
        ];

        let table = RankTable::from_rankings(&rows).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.ordered()[0], ids[2]);
        assert_eq!(table.ordered()[2], ids[0]);
        assert!(table.contains(ids[1]));
        assert!(!table.is_active(ids[1]));
    }

    #[test]
    fn rejects_broken_density() {
        let ids = players(3);

        let gap = vec![row(ids[0], Some(1)), row(ids[1], Some(3))];
        assert!(matches!(RankTable::from_rankings(&gap), Err(LadderError::Consistency(_))));

        let duplicate = vec![row(ids[0], Some(1)), row(ids[1], Some(1)), row(ids[2], Some(2))];
        assert!(matches!(RankTable::from_rankings(&duplicate), Err(LadderError::Consistency(_))));

        let mut ranked_inactive = row(ids[0], Some(1));
        ranked_inactive.is_active = false;
        assert!(matches!(
            RankTable::from_rankings(&[ranked_inactive]),
            Err(LadderError::Consistency(_))
        ));

        let mut unranked_active = row(ids[0], None);
        unranked_active.is_active = true;
        assert!(matches!(
            RankTable::from_rankings(&[unranked_active]),
            Err(LadderError::Consistency(_))
        ));

        let zero = vec![row(ids[0], Some(0))];
        assert!(matches!(RankTable::from_rankings(&zero), Err(LadderError::Consistency(_))));
    }

    #[test]
    fn changed_rows_reports_only_moves() {
        let ids = players(4);
        let rows: Vec<Ranking> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| row(*id, Some(index as i32 + 1)))
            .collect();
        let mut table = RankTable::from_rankings(&rows).unwrap();

        table.insert_adjacent(ids[2], ids[1], true).unwrap();
        let changed = table.changed_rows(&rows, Utc::now());

        assert_eq!(changed.len(), 2);
        assert!(changed.iter().any(|r| r.player_id == ids[2] && r.rank == Some(2)));
        assert!(changed.iter().any(|r| r.player_id == ids[1] && r.rank == Some(3)));

        table.remove(ids[0]).unwrap();
        let changed = table.changed_rows(&rows, Utc::now());
        let removed = changed.iter().find(|r| r.player_id == ids[0]).unwrap();
        assert_eq!(removed.rank, None);
        assert!(!removed.is_active);
        // ids[1] ends up back on rank 2
        assert_eq!(changed.len(), 3);
    }

    #[test]
    fn rejoined_rows_restart_their_active_stretch() {
        let ids = players(2);
        let joined = Utc::now() - Duration::days(90);
        let rows: Vec<Ranking> = vec![
            Ranking { active_since: joined, ..row(ids[0], Some(1)) },
            Ranking { active_since: joined, ..row(ids[1], None) },
        ];
        let mut table = RankTable::from_rankings(&rows).unwrap();
        table.rejoin(ids[1]).unwrap();

        let now = Utc::now();
        let changed = table.changed_rows(&rows, now);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].player_id, ids[1]);
        assert_eq!(changed[0].rank, Some(2));
        assert_eq!(changed[0].active_since, now);

        table.demote_one(ids[0]).unwrap();
        let moved = table
            .changed_rows(&rows, now)
            .into_iter()
            .find(|r| r.player_id == ids[0])
            .unwrap();
        assert_eq!(moved.active_since, joined);
    }

    #[test]
    fn below_names_the_next_active_player() {
        let ids = players(3);
        let mut table = table(&ids);

        assert_eq!(table.below(ids[0]), Some(ids[1]));
        assert_eq!(table.below(ids[2]), None);

        table.remove(ids[1]).unwrap();
        assert_eq!(table.below(ids[0]), Some(ids[2]));
        assert_eq!(table.below(ids[1]), None);
    }
}
