use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::GameResult;

/// Optional record-keeping fields of a reported game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GameDetails {
    pub time_control: Option<String>,
    pub round: Option<i16>,
    pub eco: Option<String>,
    pub pgn: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameReport {
    pub ladder_id: Uuid,
    pub white_id: Uuid,
    pub black_id: Uuid,
    pub result: GameResult,
    /// When the game was played. Ratings are stamped with this, not "now".
    pub played_at: DateTime<Utc>,
    pub details: GameDetails,
}

impl GameReport {
    pub fn new(
        ladder_id: Uuid,
        white_id: Uuid,
        black_id: Uuid,
        result: GameResult,
        played_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ladder_id,
            white_id,
            black_id,
            result,
            played_at,
            details: GameDetails::default(),
        }
    }

    pub fn with_details(mut self, details: GameDetails) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Standing {
    pub rank: i32,
    pub player_id: Uuid,
    pub rating: Decimal,
    pub int_rating: i64,
    pub games_played: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MemberStatus {
    pub player_id: Uuid,
    pub ladder_id: Uuid,
    pub rank: Option<i32>,
    pub is_active: bool,
    pub rating: Decimal,
    pub int_rating: i64,
    pub games_played: i64,
}

/// Where an inactivity demotion left a player, read in the same unit of work
/// that moved them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Demotion {
    pub player_id: Uuid,
    pub rank_before: i32,
    pub rank_after: i32,
}

impl Demotion {
    /// Places lost.
    pub fn places(&self) -> i32 {
        self.rank_after - self.rank_before
    }

    pub fn moved(&self) -> bool {
        self.places() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CrunchSummary {
    pub games_replayed: usize,
    pub ratings_deleted: u64,
    pub ratings_written: usize,
}
