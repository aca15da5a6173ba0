//! Persistence seam of the ladder core.
//!
//! [`LadderStore::begin`] hands out a [`LadderTx`]: an exclusive unit of work
//! on one ladder. Writes made through it become visible only on
//! [`LadderTx::commit`]; dropping it discards them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LadderResult, Result};
use crate::models::{Game, Ladder, NewGame, NewLadder, NewPlayer, NewRating, Player, Ranking, Rating};

#[async_trait]
pub trait LadderStore: Send + Sync {
    type Tx: LadderTx;

    /// Lock `ladder_id` for exclusive use, waiting a bounded time.
    ///
    /// Fails with `InvalidState` for an unknown ladder and `LockTimeout` when
    /// the ladder stays busy.
    async fn begin(&self, ladder_id: Uuid) -> LadderResult<Self::Tx>;

    async fn create_player(&self, new: &NewPlayer) -> Result<Player>;

    async fn find_player(&self, player_id: Uuid) -> Result<Player>;

    async fn create_ladder(&self, new: &NewLadder) -> Result<Ladder>;

    async fn find_ladder(&self, ladder_id: Uuid) -> Result<Ladder>;

    async fn list_ladders(&self) -> Result<Vec<Ladder>>;
}

#[async_trait]
pub trait LadderTx: Send {
    fn ladder(&self) -> &Ladder;

    async fn player_exists(&mut self, player_id: Uuid) -> Result<bool>;

    async fn rankings(&mut self) -> Result<Vec<Ranking>>;

    async fn insert_ranking(&mut self, ranking: &Ranking) -> Result<()>;

    /// Write rank, activity and `active_since` of every given row as one batch.
    async fn update_rankings(&mut self, rankings: &[Ranking]) -> Result<()>;

    /// Most recent rating row by (`rated_at`, `seq`).
    async fn latest_rating(&mut self, player_id: Uuid) -> Result<Option<Rating>>;

    /// Rating rows ordered by (`rated_at`, `seq`), optionally for one player.
    async fn ratings(&mut self, player_id: Option<Uuid>) -> Result<Vec<Rating>>;

    /// Games involving the player with `played_at <= up_to`.
    async fn prior_game_count(&mut self, player_id: Uuid, up_to: DateTime<Utc>) -> Result<i64>;

    /// All games ordered by (`played_at`, `seq`).
    async fn games(&mut self) -> Result<Vec<Game>>;

    async fn insert_game(&mut self, game: &NewGame) -> Result<Game>;

    async fn update_game_ratings(&mut self, game_id: Uuid, white: Decimal, black: Decimal) -> Result<()>;

    async fn insert_rating(&mut self, rating: &NewRating) -> Result<Rating>;

    async fn delete_ratings(&mut self) -> Result<u64>;

    async fn commit(self) -> Result<()>;
}
