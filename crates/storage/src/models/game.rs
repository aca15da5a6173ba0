use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "game_result", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    /// Points scored by (white, black).
    pub fn scores(self) -> (Decimal, Decimal) {
        let half = Decimal::new(5, 1);
        match self {
            Self::WhiteWins => (Decimal::ONE, Decimal::ZERO),
            Self::BlackWins => (Decimal::ZERO, Decimal::ONE),
            Self::Draw => (half, half),
        }
    }

    /// PGN-style notation.
    pub fn notation(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
        }
    }
}

/// A reported game.
///
/// `white_rating`/`black_rating` are the ratings both players held when the
/// game was reported (or replayed by a crunch). `seq` is the insertion order and
/// breaks ties between games reported with the same `played_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Game {
    pub game_id: Uuid,
    pub ladder_id: Uuid,
    pub white_id: Uuid,
    pub black_id: Uuid,
    pub result: GameResult,
    pub played_at: DateTime<Utc>,
    pub white_rating: Option<Decimal>,
    pub black_rating: Option<Decimal>,
    pub time_control: Option<String>,
    pub round: Option<i16>,
    pub eco: Option<String>,
    pub pgn: Option<String>,
    pub seq: i64,
}

impl Game {
    pub fn involves(&self, player_id: Uuid) -> bool {
        self.white_id == player_id || self.black_id == player_id
    }
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub ladder_id: Uuid,
    pub white_id: Uuid,
    pub black_id: Uuid,
    pub result: GameResult,
    pub played_at: DateTime<Utc>,
    pub white_rating: Option<Decimal>,
    pub black_rating: Option<Decimal>,
    pub time_control: Option<String>,
    pub round: Option<i16>,
    pub eco: Option<String>,
    pub pgn: Option<String>,
}
