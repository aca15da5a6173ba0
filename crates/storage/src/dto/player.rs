use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlayerResponse {
    pub player_id: Uuid,
    pub user_id: String,
    pub is_member: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for registering a player
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePlayerRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "User id must be between 1 and 255 characters"
    ))]
    pub user_id: String,

    pub is_member: Option<bool>,
}

impl From<CreatePlayerRequest> for crate::models::NewPlayer {
    fn from(request: CreatePlayerRequest) -> Self {
        Self {
            user_id: request.user_id,
            is_member: request.is_member,
        }
    }
}

impl From<crate::models::Player> for PlayerResponse {
    fn from(player: crate::models::Player) -> Self {
        Self {
            player_id: player.player_id,
            user_id: player.user_id,
            is_member: player.is_member,
            created_at: player.created_at,
        }
    }
}
