use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::engine::{GameDetails, GameReport};
use crate::models::{Game, GameResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GameResponse {
    pub game_id: Uuid,
    pub ladder_id: Uuid,
    pub white_id: Uuid,
    pub black_id: Uuid,
    pub result: GameResult,
    /// PGN result notation, e.g. `1/2-1/2`
    pub notation: String,
    pub played_at: DateTime<Utc>,
    pub white_rating: Option<Decimal>,
    pub black_rating: Option<Decimal>,
    pub time_control: Option<String>,
    pub round: Option<i16>,
    pub eco: Option<String>,
    pub pgn: Option<String>,
}

/// Request payload for reporting a finished game
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReportGameRequest {
    pub white_id: Uuid,
    pub black_id: Uuid,
    pub result: GameResult,

    /// Defaults to the time the report is received
    pub played_at: Option<DateTime<Utc>>,

    /// Stored in a 25 character column
    #[validate(length(max = 25))]
    pub time_control: Option<String>,

    #[validate(range(min = 1))]
    pub round: Option<i16>,

    #[validate(length(min = 3, max = 3, message = "ECO codes are three characters"))]
    pub eco: Option<String>,

    #[validate(length(max = 2500))]
    pub pgn: Option<String>,
}

impl ReportGameRequest {
    pub fn into_report(self, ladder_id: Uuid, received_at: DateTime<Utc>) -> GameReport {
        GameReport::new(
            ladder_id,
            self.white_id,
            self.black_id,
            self.result,
            self.played_at.unwrap_or(received_at),
        )
        .with_details(GameDetails {
            time_control: self.time_control,
            round: self.round,
            eco: self.eco,
            pgn: self.pgn,
        })
    }
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        Self {
            game_id: game.game_id,
            ladder_id: game.ladder_id,
            white_id: game.white_id,
            black_id: game.black_id,
            result: game.result,
            notation: game.result.notation().to_string(),
            played_at: game.played_at,
            white_rating: game.white_rating,
            black_rating: game.black_rating,
            time_control: game.time_control,
            round: game.round,
            eco: game.eco,
            pgn: game.pgn,
        }
    }
}
