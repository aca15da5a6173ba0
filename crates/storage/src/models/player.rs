use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A club member that can hold rankings on ladders.
///
/// `user_id` is an opaque reference into whatever identity system registered
/// the player; the ladder core never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Player {
    pub player_id: Uuid,
    pub user_id: String,
    pub is_member: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub user_id: String,
    pub is_member: Option<bool>,
}
