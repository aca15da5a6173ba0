use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{LadderStore, LadderTx};
use crate::error::{LadderError, LadderResult, Result, StorageError};
use crate::models::{Game, Ladder, NewGame, NewLadder, NewPlayer, NewRating, Player, Ranking, Rating};

const PLAYER_COLUMNS: &str = "player_id, user_id, is_member, created_at";

const LADDER_COLUMNS: &str = r#"
    ladder_id, name, kind, description, location, algorithm, algorithm_params,
    default_initial_rating, start_date, end_date, inactivity_period_days,
    demotion_inc, created_at
"#;

const RANKING_COLUMNS: &str =
    "ranking_id, player_id, ladder_id, rank, initial_rating, is_active, joined_at, active_since";

const GAME_COLUMNS: &str = r#"
    game_id, ladder_id, white_id, black_id, result, played_at, white_rating,
    black_rating, time_control, round, eco, pgn, seq
"#;

const RATING_COLUMNS: &str = "rating_id, player_id, ladder_id, rating, rated_at, game_id, seq";

/// Postgres-backed store. A unit of work is a transaction holding a row lock on
/// the ladder, so concurrent writers on one ladder queue up behind each other.
#[derive(Clone)]
pub struct PgLadderStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLadderStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LadderStore for PgLadderStore {
    type Tx = PgLadderTx;

    async fn begin(&self, ladder_id: Uuid) -> LadderResult<PgLadderTx> {
        let mut tx = self.pool.begin().await?;

        // SET does not take bind parameters; the value is an integer we own.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let ladder = sqlx::query_as::<_, Ladder>(&format!(
            "SELECT {LADDER_COLUMNS} FROM ladders WHERE ladder_id = $1 FOR UPDATE"
        ))
        .bind(ladder_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_lock_timeout() {
                LadderError::LockTimeout(ladder_id)
            } else {
                LadderError::from(error)
            }
        })?
        .ok_or_else(|| LadderError::invalid_state(format!("unknown ladder {ladder_id}")))?;

        Ok(PgLadderTx { tx, ladder })
    }

    async fn create_player(&self, new: &NewPlayer) -> Result<Player> {
        sqlx::query_as::<_, Player>(&format!(
            "INSERT INTO players (user_id, is_member) VALUES ($1, $2) RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(&new.user_id)
        .bind(new.is_member)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                StorageError::ConstraintViolation(format!(
                    "user {} already has a player profile",
                    new.user_id
                ))
            } else {
                error
            }
        })
    }

    async fn find_player(&self, player_id: Uuid) -> Result<Player> {
        sqlx::query_as::<_, Player>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = $1"
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn create_ladder(&self, new: &NewLadder) -> Result<Ladder> {
        let ladder = sqlx::query_as::<_, Ladder>(&format!(
            r#"
            INSERT INTO ladders (
                name, kind, description, location, algorithm, algorithm_params,
                default_initial_rating, start_date, end_date, inactivity_period_days,
                demotion_inc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {LADDER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.kind)
        .bind(&new.description)
        .bind(&new.location)
        .bind(&new.algorithm)
        .bind(Json(&new.algorithm_params))
        .bind(new.default_initial_rating)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.inactivity_period_days)
        .bind(new.demotion_inc)
        .fetch_one(&self.pool)
        .await?;

        Ok(ladder)
    }

    async fn find_ladder(&self, ladder_id: Uuid) -> Result<Ladder> {
        sqlx::query_as::<_, Ladder>(&format!(
            "SELECT {LADDER_COLUMNS} FROM ladders WHERE ladder_id = $1"
        ))
        .bind(ladder_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn list_ladders(&self) -> Result<Vec<Ladder>> {
        let ladders = sqlx::query_as::<_, Ladder>(&format!(
            "SELECT {LADDER_COLUMNS} FROM ladders ORDER BY name, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(ladders)
    }
}

pub struct PgLadderTx {
    tx: Transaction<'static, Postgres>,
    ladder: Ladder,
}

impl PgLadderTx {
    fn ladder_id(&self) -> Uuid {
        self.ladder.ladder_id
    }
}

#[async_trait]
impl LadderTx for PgLadderTx {
    fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    async fn player_exists(&mut self, player_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM players WHERE player_id = $1)",
        )
        .bind(player_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn rankings(&mut self) -> Result<Vec<Ranking>> {
        let ladder_id = self.ladder_id();
        let rankings = sqlx::query_as::<_, Ranking>(&format!(
            r#"
            SELECT {RANKING_COLUMNS}
            FROM rankings
            WHERE ladder_id = $1
            ORDER BY rank NULLS LAST, joined_at
            "#
        ))
        .bind(ladder_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rankings)
    }

    async fn insert_ranking(&mut self, ranking: &Ranking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rankings (ranking_id, player_id, ladder_id, rank, initial_rating, is_active, joined_at, active_since)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(ranking.ranking_id)
        .bind(ranking.player_id)
        .bind(ranking.ladder_id)
        .bind(ranking.rank)
        .bind(ranking.initial_rating)
        .bind(ranking.is_active)
        .bind(ranking.joined_at)
        .bind(ranking.active_since)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            let error = StorageError::from(e);
            if error.is_unique_violation() {
                StorageError::ConstraintViolation(format!(
                    "player {} already ranked on ladder {}",
                    ranking.player_id, ranking.ladder_id
                ))
            } else {
                error
            }
        })?;

        Ok(())
    }

    async fn update_rankings(&mut self, rankings: &[Ranking]) -> Result<()> {
        if rankings.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = rankings.iter().map(|r| r.ranking_id).collect();
        let ranks: Vec<Option<i32>> = rankings.iter().map(|r| r.rank).collect();
        let active: Vec<bool> = rankings.iter().map(|r| r.is_active).collect();
        let since: Vec<DateTime<Utc>> = rankings.iter().map(|r| r.active_since).collect();

        let result = sqlx::query(
            r#"
            UPDATE rankings AS r
            SET rank = u.rank, is_active = u.is_active, active_since = u.active_since
            FROM UNNEST($1::uuid[], $2::int4[], $3::bool[], $4::timestamptz[])
                AS u(ranking_id, rank, is_active, active_since)
            WHERE r.ranking_id = u.ranking_id
            "#,
        )
        .bind(&ids)
        .bind(&ranks)
        .bind(&active)
        .bind(&since)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != rankings.len() as u64 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn latest_rating(&mut self, player_id: Uuid) -> Result<Option<Rating>> {
        let ladder_id = self.ladder_id();
        let rating = sqlx::query_as::<_, Rating>(&format!(
            r#"
            SELECT {RATING_COLUMNS}
            FROM ratings
            WHERE ladder_id = $1 AND player_id = $2
            ORDER BY rated_at DESC, seq DESC
            LIMIT 1
            "#
        ))
        .bind(ladder_id)
        .bind(player_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(rating)
    }

    async fn ratings(&mut self, player_id: Option<Uuid>) -> Result<Vec<Rating>> {
        let ladder_id = self.ladder_id();
        let ratings = sqlx::query_as::<_, Rating>(&format!(
            r#"
            SELECT {RATING_COLUMNS}
            FROM ratings
            WHERE ladder_id = $1 AND ($2::uuid IS NULL OR player_id = $2)
            ORDER BY rated_at, seq
            "#
        ))
        .bind(ladder_id)
        .bind(player_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(ratings)
    }

    async fn prior_game_count(&mut self, player_id: Uuid, up_to: DateTime<Utc>) -> Result<i64> {
        let ladder_id = self.ladder_id();
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM games
            WHERE ladder_id = $1
              AND (white_id = $2 OR black_id = $2)
              AND played_at <= $3
            "#,
        )
        .bind(ladder_id)
        .bind(player_id)
        .bind(up_to)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn games(&mut self) -> Result<Vec<Game>> {
        let ladder_id = self.ladder_id();
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE ladder_id = $1 ORDER BY played_at, seq"
        ))
        .bind(ladder_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(games)
    }

    async fn insert_game(&mut self, new: &NewGame) -> Result<Game> {
        let game = sqlx::query_as::<_, Game>(&format!(
            r#"
            INSERT INTO games (
                ladder_id, white_id, black_id, result, played_at, white_rating,
                black_rating, time_control, round, eco, pgn
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {GAME_COLUMNS}
            "#
        ))
        .bind(new.ladder_id)
        .bind(new.white_id)
        .bind(new.black_id)
        .bind(new.result)
        .bind(new.played_at)
        .bind(new.white_rating)
        .bind(new.black_rating)
        .bind(&new.time_control)
        .bind(new.round)
        .bind(&new.eco)
        .bind(&new.pgn)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(game)
    }

    async fn update_game_ratings(&mut self, game_id: Uuid, white: Decimal, black: Decimal) -> Result<()> {
        let result = sqlx::query(
            "UPDATE games SET white_rating = $2, black_rating = $3 WHERE game_id = $1",
        )
        .bind(game_id)
        .bind(white)
        .bind(black)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn insert_rating(&mut self, new: &NewRating) -> Result<Rating> {
        let rating = sqlx::query_as::<_, Rating>(&format!(
            r#"
            INSERT INTO ratings (player_id, ladder_id, rating, rated_at, game_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(new.player_id)
        .bind(new.ladder_id)
        .bind(new.rating)
        .bind(new.rated_at)
        .bind(new.game_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(rating)
    }

    async fn delete_ratings(&mut self) -> Result<u64> {
        let ladder_id = self.ladder_id();
        let result = sqlx::query("DELETE FROM ratings WHERE ladder_id = $1")
            .bind(ladder_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
