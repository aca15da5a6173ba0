//! Process-local store. Each ladder sits behind its own async mutex; a unit of
//! work edits a copy of the ladder and swaps it in on commit. Ladder metadata
//! never changes after creation and is read without taking that mutex.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{LadderStore, LadderTx};
use crate::error::{LadderError, LadderResult, Result, StorageError};
use crate::history;
use crate::models::{Game, Ladder, NewGame, NewLadder, NewPlayer, NewRating, Player, Ranking, Rating};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct LadderState {
    ladder: Ladder,
    rankings: Vec<Ranking>,
    games: Vec<Game>,
    ratings: Vec<Rating>,
    next_seq: i64,
}

impl LadderState {
    fn bump_seq(&mut self) -> i64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

type Players = Arc<RwLock<HashMap<Uuid, Player>>>;

#[derive(Clone)]
struct LadderCell {
    ladder: Ladder,
    state: Arc<Mutex<LadderState>>,
}

pub struct MemoryStore {
    players: Players,
    ladders: RwLock<HashMap<Uuid, LadderCell>>,
    lock_timeout: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            players: Arc::default(),
            ladders: RwLock::default(),
            lock_timeout,
        }
    }

    fn ladder_cell(&self, ladder_id: Uuid) -> Option<LadderCell> {
        self.ladders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ladder_id)
            .cloned()
    }
}

#[async_trait]
impl LadderStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self, ladder_id: Uuid) -> LadderResult<MemoryTx> {
        let cell = self
            .ladder_cell(ladder_id)
            .ok_or_else(|| LadderError::invalid_state(format!("unknown ladder {ladder_id}")))?;

        let guard = tokio::time::timeout(self.lock_timeout, cell.state.lock_owned())
            .await
            .map_err(|_| LadderError::LockTimeout(ladder_id))?;
        let work = (*guard).clone();

        Ok(MemoryTx {
            guard,
            work,
            players: Arc::clone(&self.players),
        })
    }

    async fn create_player(&self, new: &NewPlayer) -> Result<Player> {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        if players.values().any(|p| p.user_id == new.user_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "user {} already has a player profile",
                new.user_id
            )));
        }

        let player = Player {
            player_id: Uuid::new_v4(),
            user_id: new.user_id.clone(),
            is_member: new.is_member,
            created_at: Utc::now(),
        };
        players.insert(player.player_id, player.clone());
        Ok(player)
    }

    async fn find_player(&self, player_id: Uuid) -> Result<Player> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn create_ladder(&self, new: &NewLadder) -> Result<Ladder> {
        let ladder = Ladder {
            ladder_id: Uuid::new_v4(),
            name: new.name.clone(),
            kind: new.kind,
            description: new.description.clone(),
            location: new.location.clone(),
            algorithm: new.algorithm.clone(),
            algorithm_params: sqlx::types::Json(new.algorithm_params.clone()),
            default_initial_rating: new.default_initial_rating,
            start_date: new.start_date,
            end_date: new.end_date,
            inactivity_period_days: new.inactivity_period_days,
            demotion_inc: new.demotion_inc,
            created_at: Utc::now(),
        };

        let state = LadderState {
            ladder: ladder.clone(),
            rankings: Vec::new(),
            games: Vec::new(),
            ratings: Vec::new(),
            next_seq: 0,
        };
        self.ladders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                ladder.ladder_id,
                LadderCell {
                    ladder: ladder.clone(),
                    state: Arc::new(Mutex::new(state)),
                },
            );

        Ok(ladder)
    }

    async fn find_ladder(&self, ladder_id: Uuid) -> Result<Ladder> {
        self.ladder_cell(ladder_id)
            .map(|cell| cell.ladder)
            .ok_or(StorageError::NotFound)
    }

    async fn list_ladders(&self) -> Result<Vec<Ladder>> {
        let mut ladders: Vec<Ladder> = self
            .ladders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|cell| cell.ladder.clone())
            .collect();
        ladders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ladders)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<LadderState>,
    work: LadderState,
    players: Players,
}

#[async_trait]
impl LadderTx for MemoryTx {
    fn ladder(&self) -> &Ladder {
        &self.work.ladder
    }

    async fn player_exists(&mut self, player_id: Uuid) -> Result<bool> {
        Ok(self
            .players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&player_id))
    }

    async fn rankings(&mut self) -> Result<Vec<Ranking>> {
        Ok(self.work.rankings.clone())
    }

    async fn insert_ranking(&mut self, ranking: &Ranking) -> Result<()> {
        if self.work.rankings.iter().any(|r| r.player_id == ranking.player_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "player {} already ranked on ladder {}",
                ranking.player_id, ranking.ladder_id
            )));
        }
        self.work.rankings.push(ranking.clone());
        Ok(())
    }

    async fn update_rankings(&mut self, rankings: &[Ranking]) -> Result<()> {
        for update in rankings {
            let row = self
                .work
                .rankings
                .iter_mut()
                .find(|r| r.ranking_id == update.ranking_id)
                .ok_or(StorageError::NotFound)?;
            row.rank = update.rank;
            row.is_active = update.is_active;
            row.active_since = update.active_since;
        }
        Ok(())
    }

    async fn latest_rating(&mut self, player_id: Uuid) -> Result<Option<Rating>> {
        Ok(history::latest(self.work.ratings.iter().filter(|r| r.player_id == player_id)).cloned())
    }

    async fn ratings(&mut self, player_id: Option<Uuid>) -> Result<Vec<Rating>> {
        let mut rows: Vec<Rating> = self
            .work
            .ratings
            .iter()
            .filter(|r| player_id.is_none_or(|id| r.player_id == id))
            .cloned()
            .collect();
        rows.sort_by_key(Rating::recency);
        Ok(rows)
    }

    async fn prior_game_count(&mut self, player_id: Uuid, up_to: DateTime<Utc>) -> Result<i64> {
        let count = self
            .work
            .games
            .iter()
            .filter(|g| g.involves(player_id) && g.played_at <= up_to)
            .count();
        Ok(count as i64)
    }

    async fn games(&mut self) -> Result<Vec<Game>> {
        let mut games = self.work.games.clone();
        games.sort_by_key(|g| (g.played_at, g.seq));
        Ok(games)
    }

    async fn insert_game(&mut self, new: &NewGame) -> Result<Game> {
        let game = Game {
            game_id: Uuid::new_v4(),
            ladder_id: new.ladder_id,
            white_id: new.white_id,
            black_id: new.black_id,
            result: new.result,
            played_at: new.played_at,
            white_rating: new.white_rating,
            black_rating: new.black_rating,
            time_control: new.time_control.clone(),
            round: new.round,
            eco: new.eco.clone(),
            pgn: new.pgn.clone(),
            seq: self.work.bump_seq(),
        };
        self.work.games.push(game.clone());
        Ok(game)
    }

    async fn update_game_ratings(&mut self, game_id: Uuid, white: Decimal, black: Decimal) -> Result<()> {
        let game = self
            .work
            .games
            .iter_mut()
            .find(|g| g.game_id == game_id)
            .ok_or(StorageError::NotFound)?;
        game.white_rating = Some(white);
        game.black_rating = Some(black);
        Ok(())
    }

    async fn insert_rating(&mut self, new: &NewRating) -> Result<Rating> {
        let rating = Rating {
            rating_id: Uuid::new_v4(),
            player_id: new.player_id,
            ladder_id: new.ladder_id,
            rating: new.rating,
            rated_at: new.rated_at,
            game_id: new.game_id,
            seq: self.work.bump_seq(),
        };
        self.work.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn delete_ratings(&mut self) -> Result<u64> {
        let removed = self.work.ratings.len() as u64;
        self.work.ratings.clear();
        Ok(removed)
    }

    async fn commit(self) -> Result<()> {
        let MemoryTx {
            mut guard, work, ..
        } = self;
        *guard = work;
        Ok(())
    }
}
