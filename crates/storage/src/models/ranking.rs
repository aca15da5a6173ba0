use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A player's membership on a ladder. Unique per (player, ladder).
///
/// `rank` is `None` exactly when the membership is inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ranking {
    pub ranking_id: Uuid,
    pub player_id: Uuid,
    pub ladder_id: Uuid,
    pub rank: Option<i32>,
    pub initial_rating: Decimal,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    /// Start of the current active stretch: the join, or the latest return
    /// from inactivity.
    pub active_since: DateTime<Utc>,
}
