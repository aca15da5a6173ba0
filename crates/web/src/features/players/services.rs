use storage::{dto::player::CreatePlayerRequest, error::LadderResult, models::Player};
use uuid::Uuid;

use crate::state::Engine;

/// Register a new player
pub async fn create_player(engine: &Engine, request: CreatePlayerRequest) -> LadderResult<Player> {
    engine.create_player(&request.into()).await
}

/// Get player by id
pub async fn get_player(engine: &Engine, player_id: Uuid) -> LadderResult<Player> {
    engine.player(player_id).await
}
