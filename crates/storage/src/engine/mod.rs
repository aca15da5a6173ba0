//! Rating and ranking orchestration.
//!
//! Every public operation takes one unit of work from the store, does all of
//! its reads, computations and writes inside it, and commits once. An error at
//! any step drops the unit of work and nothing becomes visible.

pub mod policy;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LadderError, LadderResult};
use crate::history::RatingHistory;
use crate::models::{Game, Ladder, NewGame, NewLadder, NewPlayer, NewRating, Player, Ranking, Rating};
use crate::models::rating::int_rating;
use crate::rank_table::RankTable;
use crate::rating::{AlgorithmRegistry, MAX_RATING, RatingInput, RatingPair};
use crate::repository::{LadderStore, LadderTx};

pub use policy::RankAdjustment;
pub use types::{CrunchSummary, Demotion, GameDetails, GameReport, MemberStatus, Standing};

pub struct LadderEngine<S> {
    store: S,
    algorithms: AlgorithmRegistry,
    /// Ladders whose stored ranks failed the density check.
    quarantined: Mutex<HashSet<Uuid>>,
}

impl<S: LadderStore> LadderEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_algorithms(store, AlgorithmRegistry::default())
    }

    pub fn with_algorithms(store: S, algorithms: AlgorithmRegistry) -> Self {
        Self {
            store,
            algorithms,
            quarantined: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn algorithms(&self) -> &AlgorithmRegistry {
        &self.algorithms
    }

    pub async fn create_player(&self, new: &NewPlayer) -> LadderResult<Player> {
        if new.user_id.trim().is_empty() {
            return Err(LadderError::validation("user id must not be empty"));
        }
        let player = self.store.create_player(new).await?;
        tracing::info!("Registered player {} for user {}", player.player_id, player.user_id);
        Ok(player)
    }

    pub async fn player(&self, player_id: Uuid) -> LadderResult<Player> {
        Ok(self.store.find_player(player_id).await?)
    }

    pub async fn create_ladder(&self, new: &NewLadder) -> LadderResult<Ladder> {
        self.algorithms.resolve(&new.algorithm, &new.algorithm_params)?;

        if let (Some(start), Some(end)) = (new.start_date, new.end_date)
            && start > end
        {
            return Err(LadderError::validation("ladder start date is after its end date"));
        }
        if new.inactivity_period_days.is_some_and(|days| days < 1)
            || new.demotion_inc.is_some_and(|places| places < 1)
        {
            return Err(LadderError::validation(
                "inactivity period and demotion increment must be positive",
            ));
        }
        check_initial_rating(new.default_initial_rating)?;

        let ladder = self.store.create_ladder(new).await?;
        tracing::info!(
            "Created ladder '{}' ({}) using algorithm '{}'",
            ladder.name,
            ladder.ladder_id,
            ladder.algorithm
        );
        Ok(ladder)
    }

    pub async fn ladder(&self, ladder_id: Uuid) -> LadderResult<Ladder> {
        Ok(self.store.find_ladder(ladder_id).await?)
    }

    pub async fn list_ladders(&self) -> LadderResult<Vec<Ladder>> {
        Ok(self.store.list_ladders().await?)
    }

    /// Record a game, update both ratings and adjust ranks.
    pub async fn report_game(&self, report: GameReport) -> LadderResult<Game> {
        let GameReport {
            ladder_id,
            white_id,
            black_id,
            result,
            played_at,
            details,
        } = report;

        if white_id == black_id {
            return Err(LadderError::validation("a player cannot play against themselves"));
        }

        let mut tx = self.begin(ladder_id).await?;
        let ladder = tx.ladder().clone();
        if !ladder.accepts_games_on(played_at) {
            return Err(LadderError::validation(format!(
                "game date {} is outside the activity window of ladder '{}'",
                played_at.date_naive(),
                ladder.name
            )));
        }

        let rankings = tx.rankings().await?;
        let mut table = self.load_table(ladder_id, &rankings)?;
        let white_ranking = participant(&rankings, white_id)?;
        let black_ranking = participant(&rankings, black_id)?;

        let algorithm = self
            .algorithms
            .resolve(&ladder.algorithm, &ladder.algorithm_params)?;

        let white_before = current_in(&mut tx, white_ranking).await?;
        let black_before = current_in(&mut tx, black_ranking).await?;
        let input = RatingInput {
            white: white_before,
            black: black_before,
            result,
            white_games: tx.prior_game_count(white_id, played_at).await?,
            black_games: tx.prior_game_count(black_id, played_at).await?,
        };
        let after = storable(algorithm.compute(&input))?;
        tracing::debug!(
            "{} rates {} ({} -> {}) vs {} ({} -> {})",
            algorithm.name(),
            white_id,
            white_before,
            after.white,
            black_id,
            black_before,
            after.black
        );

        let game = tx
            .insert_game(&NewGame {
                ladder_id,
                white_id,
                black_id,
                result,
                played_at,
                white_rating: Some(white_before),
                black_rating: Some(black_before),
                time_control: details.time_control,
                round: details.round,
                eco: details.eco,
                pgn: details.pgn,
            })
            .await?;

        for (player_id, rating) in [(white_id, after.white), (black_id, after.black)] {
            tx.insert_rating(&NewRating {
                player_id,
                ladder_id,
                rating,
                rated_at: played_at,
                game_id: Some(game.game_id),
            })
            .await?;
        }

        // Playing a game reawakens an inactive membership at the bottom.
        for player_id in [white_id, black_id] {
            if !table.is_active(player_id) {
                let rank = table.rejoin(player_id)?;
                tracing::info!("Reawakened player {} on ladder {} at rank {}", player_id, ladder_id, rank);
            }
        }

        let adjustment = policy::apply_result(&mut table, white_id, black_id, result)?;
        tx.update_rankings(&table.changed_rows(&rankings, Utc::now())).await?;
        tx.commit().await?;

        tracing::info!(
            "Recorded game {} on ladder {}: {} {} {} ({:?})",
            game.game_id,
            ladder_id,
            white_id,
            result.notation(),
            black_id,
            adjustment
        );
        Ok(game)
    }

    pub async fn current_rating(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<Decimal> {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        let ranking = membership(&rankings, player_id)?;
        current_in(&mut tx, ranking).await
    }

    pub async fn current_rank(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<Option<i32>> {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        let table = self.load_table(ladder_id, &rankings)?;
        membership(&rankings, player_id)?;
        Ok(table.rank_of(player_id))
    }

    pub async fn member_status(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<MemberStatus> {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        let table = self.load_table(ladder_id, &rankings)?;
        let ranking = membership(&rankings, player_id)?;
        let rating = current_in(&mut tx, ranking).await?;
        let games_played = tx
            .games()
            .await?
            .iter()
            .filter(|game| game.involves(player_id))
            .count() as i64;

        Ok(MemberStatus {
            player_id,
            ladder_id,
            rank: table.rank_of(player_id),
            is_active: table.is_active(player_id),
            rating,
            int_rating: int_rating(rating),
            games_played,
        })
    }

    /// The player's rating as it stood at `at`: the last snapshot stamped at or
    /// before it, or the initial rating when none is.
    pub async fn current_rating_at(
        &self,
        player_id: Uuid,
        ladder_id: Uuid,
        at: DateTime<Utc>,
    ) -> LadderResult<Decimal> {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        let initial = membership(&rankings, player_id)?.initial_rating;
        let history = RatingHistory::from_rows(tx.ratings(Some(player_id)).await?);
        Ok(history.current_at(player_id, at, initial))
    }

    /// Rating snapshots of one player, oldest first.
    pub async fn rating_history(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<Vec<Rating>> {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        membership(&rankings, player_id)?;
        Ok(tx.ratings(Some(player_id)).await?)
    }

    /// Games of a ladder in play order.
    pub async fn games(&self, ladder_id: Uuid) -> LadderResult<Vec<Game>> {
        let mut tx = self.begin(ladder_id).await?;
        Ok(tx.games().await?)
    }

    /// Active members in rank order with their current ratings.
    pub async fn standings(&self, ladder_id: Uuid) -> LadderResult<Vec<Standing>> {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        let table = self.load_table(ladder_id, &rankings)?;
        let history = RatingHistory::from_rows(tx.ratings(None).await?);
        let games = tx.games().await?;

        let initial: HashMap<Uuid, Decimal> = rankings
            .iter()
            .map(|r| (r.player_id, r.initial_rating))
            .collect();

        let standings = table
            .ordered()
            .iter()
            .enumerate()
            .map(|(index, player_id)| {
                let start = initial.get(player_id).copied().unwrap_or_default();
                let rating = history.current(*player_id, start);
                Standing {
                    rank: index as i32 + 1,
                    player_id: *player_id,
                    rating,
                    int_rating: int_rating(rating),
                    games_played: games.iter().filter(|g| g.involves(*player_id)).count() as i64,
                }
            })
            .collect();

        Ok(standings)
    }

    /// Throw away the ladder's rating history and rebuild it by replaying every
    /// game in play order. Ranks are left alone.
    pub async fn crunch_ratings(&self, ladder_id: Uuid) -> LadderResult<CrunchSummary> {
        let mut tx = self.begin(ladder_id).await?;
        let ladder = tx.ladder().clone();
        let algorithm = self
            .algorithms
            .resolve(&ladder.algorithm, &ladder.algorithm_params)?;

        let initial: HashMap<Uuid, Decimal> = tx
            .rankings()
            .await?
            .into_iter()
            .map(|r| (r.player_id, r.initial_rating))
            .collect();
        let starting = |player_id: &Uuid| {
            initial
                .get(player_id)
                .copied()
                .unwrap_or(ladder.default_initial_rating)
        };

        let games = tx.games().await?;
        let ratings_deleted = tx.delete_ratings().await?;

        let mut history = RatingHistory::new();
        let mut played: HashMap<Uuid, i64> = HashMap::new();

        for game in &games {
            let white_before = history.current(game.white_id, starting(&game.white_id));
            let black_before = history.current(game.black_id, starting(&game.black_id));
            let after = storable(algorithm.compute(&RatingInput {
                white: white_before,
                black: black_before,
                result: game.result,
                white_games: played.get(&game.white_id).copied().unwrap_or_default(),
                black_games: played.get(&game.black_id).copied().unwrap_or_default(),
            }))?;

            tx.update_game_ratings(game.game_id, white_before, black_before)
                .await?;

            for (player_id, rating) in [(game.white_id, after.white), (game.black_id, after.black)] {
                let new = NewRating {
                    player_id,
                    ladder_id,
                    rating,
                    rated_at: game.played_at,
                    game_id: Some(game.game_id),
                };
                tx.insert_rating(&new).await?;
                history.record(new);
                *played.entry(player_id).or_default() += 1;
            }
        }

        tx.commit().await?;

        let summary = CrunchSummary {
            games_replayed: games.len(),
            ratings_deleted,
            ratings_written: history.len(),
        };
        tracing::info!(
            "Crunched ladder {}: replayed {} games, replaced {} ratings with {}",
            ladder_id,
            summary.games_replayed,
            summary.ratings_deleted,
            summary.ratings_written
        );
        Ok(summary)
    }

    /// Create a ranking at the bottom of the ladder.
    pub async fn join_ladder(
        &self,
        player_id: Uuid,
        ladder_id: Uuid,
        initial_rating: Option<Decimal>,
    ) -> LadderResult<Ranking> {
        if let Some(rating) = initial_rating {
            check_initial_rating(rating)?;
        }

        let mut tx = self.begin(ladder_id).await?;
        if !tx.player_exists(player_id).await? {
            return Err(LadderError::validation(format!("unknown player {player_id}")));
        }

        let rankings = tx.rankings().await?;
        let mut table = self.load_table(ladder_id, &rankings)?;
        let rank = table.join(player_id)?;

        let now = Utc::now();
        let ranking = Ranking {
            ranking_id: Uuid::new_v4(),
            player_id,
            ladder_id,
            rank: Some(rank),
            initial_rating: initial_rating.unwrap_or(tx.ladder().default_initial_rating),
            is_active: true,
            joined_at: now,
            active_since: now,
        };
        tx.insert_ranking(&ranking).await?;
        tx.commit().await?;

        tracing::info!("Player {} joined ladder {} at rank {}", player_id, ladder_id, rank);
        Ok(ranking)
    }

    /// Make the player inactive; everyone below moves up one place.
    pub async fn leave_ladder(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<()> {
        self.mutate_ranks(ladder_id, |table| table.remove(player_id))
            .await?;
        tracing::info!("Player {} left ladder {}", player_id, ladder_id);
        Ok(())
    }

    /// Reactivate the player at the bottom. Returns the new rank.
    pub async fn rejoin_ladder(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<i32> {
        let rank = self
            .mutate_ranks(ladder_id, |table| table.rejoin(player_id))
            .await?;
        tracing::info!("Player {} rejoined ladder {} at rank {}", player_id, ladder_id, rank);
        Ok(rank)
    }

    /// One step of the inactivity penalty.
    pub async fn apply_inactivity_penalty(&self, player_id: Uuid, ladder_id: Uuid) -> LadderResult<Demotion> {
        let demotion = self
            .mutate_ranks(ladder_id, |table| {
                let rank_before = active_rank(table, player_id)?;
                table.demote_one(player_id)?;
                Ok(Demotion {
                    player_id,
                    rank_before,
                    rank_after: active_rank(table, player_id)?,
                })
            })
            .await?;
        if demotion.moved() {
            tracing::info!(
                "Demoted inactive player {} on ladder {} to rank {}",
                player_id,
                ladder_id,
                demotion.rank_after
            );
        } else {
            tracing::debug!("Player {} already last on ladder {}", player_id, ladder_id);
        }
        Ok(demotion)
    }

    /// Demote an inactive player up to `steps` places in one unit of work,
    /// stopping directly above any member listed in `idle`.
    pub async fn demote_inactive(
        &self,
        player_id: Uuid,
        ladder_id: Uuid,
        steps: i32,
        idle: &HashSet<Uuid>,
    ) -> LadderResult<Demotion> {
        let demotion = self
            .mutate_ranks(ladder_id, |table| {
                let rank_before = active_rank(table, player_id)?;
                for _ in 0..steps {
                    match table.below(player_id) {
                        Some(next) if !idle.contains(&next) => {
                            table.demote_one(player_id)?;
                        }
                        _ => break,
                    }
                }
                Ok(Demotion {
                    player_id,
                    rank_before,
                    rank_after: active_rank(table, player_id)?,
                })
            })
            .await?;
        tracing::info!(
            "Inactive player {} on ladder {} moved from rank {} to {}",
            player_id,
            ladder_id,
            demotion.rank_before,
            demotion.rank_after
        );
        Ok(demotion)
    }

    /// Active members whose last activity is older than the ladder's
    /// inactivity period. Activity is the latest of their last game and the
    /// start of their current active stretch. Worst rank first.
    pub async fn inactive_players(&self, ladder_id: Uuid, as_of: DateTime<Utc>) -> LadderResult<Vec<Ranking>> {
        let mut tx = self.begin(ladder_id).await?;
        let Some(period) = tx.ladder().inactivity_period_days else {
            return Ok(Vec::new());
        };
        let cutoff = as_of - Duration::days(i64::from(period));

        let rankings = tx.rankings().await?;
        self.load_table(ladder_id, &rankings)?;

        let mut last_played: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
        for game in tx.games().await? {
            for player_id in [game.white_id, game.black_id] {
                let last = last_played.entry(player_id).or_insert(game.played_at);
                *last = (*last).max(game.played_at);
            }
        }

        let mut stale: Vec<Ranking> = rankings
            .into_iter()
            .filter(|r| r.is_active)
            .filter(|r| {
                let last_activity = last_played
                    .get(&r.player_id)
                    .map_or(r.active_since, |played| (*played).max(r.active_since));
                last_activity < cutoff
            })
            .collect();
        stale.sort_by(|a, b| b.rank.cmp(&a.rank));
        Ok(stale)
    }

    /// Renumber active rankings 1..N keeping their relative order and lift the
    /// ladder's quarantine. Returns the number of rows rewritten.
    pub async fn repair_ranks(&self, ladder_id: Uuid) -> LadderResult<usize> {
        let mut tx = self.store.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;

        let mut active: Vec<&Ranking> = rankings.iter().filter(|r| r.is_active).collect();
        active.sort_by_key(|r| (r.rank.is_none(), r.rank, r.joined_at));
        let ranks: HashMap<Uuid, i32> = active
            .iter()
            .enumerate()
            .map(|(index, r)| (r.ranking_id, index as i32 + 1))
            .collect();

        let repaired: Vec<Ranking> = rankings
            .iter()
            .filter_map(|r| {
                let rank = ranks.get(&r.ranking_id).copied();
                (r.rank != rank).then(|| Ranking { rank, ..r.clone() })
            })
            .collect();

        tx.update_rankings(&repaired).await?;
        tx.commit().await?;

        let released = self
            .quarantined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ladder_id);
        if repaired.is_empty() {
            tracing::info!("Ranks of ladder {} were already dense", ladder_id);
        } else {
            tracing::warn!("Repaired {} rankings on ladder {}", repaired.len(), ladder_id);
        }
        if released {
            tracing::info!("Ladder {} released from quarantine", ladder_id);
        }
        Ok(repaired.len())
    }

    pub fn is_quarantined(&self, ladder_id: Uuid) -> bool {
        self.quarantined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&ladder_id)
    }

    async fn begin(&self, ladder_id: Uuid) -> LadderResult<S::Tx> {
        if self.is_quarantined(ladder_id) {
            return Err(LadderError::consistency(format!(
                "ladder {ladder_id} is quarantined until its ranks are repaired"
            )));
        }
        self.store.begin(ladder_id).await
    }

    fn load_table(&self, ladder_id: Uuid, rankings: &[Ranking]) -> LadderResult<RankTable> {
        RankTable::from_rankings(rankings).inspect_err(|error| {
            if let LadderError::Consistency(reason) = error {
                tracing::error!("Ladder {} failed the rank density check: {}", ladder_id, reason);
                self.quarantined
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(ladder_id);
            }
        })
    }

    async fn mutate_ranks<T, F>(&self, ladder_id: Uuid, op: F) -> LadderResult<T>
    where
        F: FnOnce(&mut RankTable) -> LadderResult<T>,
    {
        let mut tx = self.begin(ladder_id).await?;
        let rankings = tx.rankings().await?;
        let mut table = self.load_table(ladder_id, &rankings)?;

        let outcome = op(&mut table)?;

        tx.update_rankings(&table.changed_rows(&rankings, Utc::now())).await?;
        tx.commit().await?;
        Ok(outcome)
    }
}

fn membership(rankings: &[Ranking], player_id: Uuid) -> LadderResult<&Ranking> {
    rankings
        .iter()
        .find(|r| r.player_id == player_id)
        .ok_or_else(|| LadderError::invalid_state(format!("player {player_id} has no ranking on this ladder")))
}

fn participant(rankings: &[Ranking], player_id: Uuid) -> LadderResult<&Ranking> {
    rankings
        .iter()
        .find(|r| r.player_id == player_id)
        .ok_or_else(|| LadderError::validation(format!("player {player_id} holds no ranking on this ladder")))
}

async fn current_in<T: LadderTx>(tx: &mut T, ranking: &Ranking) -> LadderResult<Decimal> {
    Ok(tx
        .latest_rating(ranking.player_id)
        .await?
        .map_or(ranking.initial_rating, |row| row.rating))
}

fn active_rank(table: &RankTable, player_id: Uuid) -> LadderResult<i32> {
    table.rank_of(player_id).ok_or_else(|| {
        LadderError::invalid_state(format!("player {player_id} is not ranked on this ladder"))
    })
}

fn check_initial_rating(rating: Decimal) -> LadderResult<()> {
    if rating.is_sign_negative() || rating > MAX_RATING {
        return Err(LadderError::validation(format!(
            "initial rating must be between 0 and {MAX_RATING}"
        )));
    }
    Ok(())
}

fn storable(pair: RatingPair) -> LadderResult<RatingPair> {
    if !pair.is_storable() {
        return Err(LadderError::validation(format!(
            "computed ratings {} / {} exceed the storable range",
            pair.white, pair.black
        )));
    }
    Ok(pair)
}
