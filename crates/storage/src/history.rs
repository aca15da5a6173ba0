//! In-memory rating history with the same "current rating" rule as the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{NewRating, Rating};

/// Pick the current row: latest `rated_at`, insertion order breaking ties.
pub fn latest<'a>(rows: impl IntoIterator<Item = &'a Rating>) -> Option<&'a Rating> {
    rows.into_iter().max_by_key(|row| row.recency())
}

/// Append-only log of rating snapshots for one ladder.
#[derive(Debug, Default, Clone)]
pub struct RatingHistory {
    rows: Vec<Rating>,
    next_seq: i64,
}

impl RatingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a log whose persisted rows are already known.
    pub fn from_rows(mut rows: Vec<Rating>) -> Self {
        rows.sort_by_key(|row| row.seq);
        let next_seq = rows.last().map_or(0, |row| row.seq + 1);
        Self { rows, next_seq }
    }

    pub fn record(&mut self, new: NewRating) -> &Rating {
        let row = Rating {
            rating_id: Uuid::new_v4(),
            player_id: new.player_id,
            ladder_id: new.ladder_id,
            rating: new.rating,
            rated_at: new.rated_at,
            game_id: new.game_id,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    pub fn current(&self, player_id: Uuid, initial: Decimal) -> Decimal {
        latest(self.for_player(player_id)).map_or(initial, |row| row.rating)
    }

    /// Rating the player held at `at`, counting rows stamped exactly at `at`.
    pub fn current_at(&self, player_id: Uuid, at: DateTime<Utc>, initial: Decimal) -> Decimal {
        latest(self.for_player(player_id).filter(|row| row.rated_at <= at))
            .map_or(initial, |row| row.rating)
    }

    pub fn for_player(&self, player_id: Uuid) -> impl Iterator<Item = &Rating> + '_ {
        self.rows.iter().filter(move |row| row.player_id == player_id)
    }

    pub fn rows(&self) -> &[Rating] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
