use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Historical rating snapshot for a player on a ladder.
///
/// Rows are only ever appended; a crunch is the one operation allowed to delete
/// and rebuild them. `seq` is the insertion order and decides between rows that
/// share a `rated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rating {
    pub rating_id: Uuid,
    pub player_id: Uuid,
    pub ladder_id: Uuid,
    pub rating: Decimal,
    pub rated_at: DateTime<Utc>,
    pub game_id: Option<Uuid>,
    pub seq: i64,
}

impl Rating {
    /// Display form: truncated toward zero.
    pub fn int_rating(&self) -> i64 {
        int_rating(self.rating)
    }

    /// Ordering key used to pick the current rating.
    pub fn recency(&self) -> (DateTime<Utc>, i64) {
        (self.rated_at, self.seq)
    }
}

pub fn int_rating(rating: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;
    rating.trunc().to_i64().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub player_id: Uuid,
    pub ladder_id: Uuid,
    pub rating: Decimal,
    pub rated_at: DateTime<Utc>,
    pub game_id: Option<Uuid>,
}
