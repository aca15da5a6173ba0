use storage::{
    dto::ladder::CreateLadderRequest,
    engine::{CrunchSummary, Standing},
    error::LadderResult,
    models::Ladder,
};
use uuid::Uuid;

use crate::state::Engine;

/// List all ladders
pub async fn list_ladders(engine: &Engine) -> LadderResult<Vec<Ladder>> {
    engine.list_ladders().await
}

/// Get ladder by id
pub async fn get_ladder(engine: &Engine, ladder_id: Uuid) -> LadderResult<Ladder> {
    engine.ladder(ladder_id).await
}

/// Create a new ladder
pub async fn create_ladder(engine: &Engine, request: CreateLadderRequest) -> LadderResult<Ladder> {
    engine.create_ladder(&request.into()).await
}

/// Active members in rank order
pub async fn standings(engine: &Engine, ladder_id: Uuid) -> LadderResult<Vec<Standing>> {
    engine.standings(ladder_id).await
}

/// Rebuild the ladder's rating history from its games
pub async fn crunch(engine: &Engine, ladder_id: Uuid) -> LadderResult<CrunchSummary> {
    engine.crunch_ratings(ladder_id).await
}

/// Renumber the ladder's ranks densely
pub async fn repair(engine: &Engine, ladder_id: Uuid) -> LadderResult<usize> {
    engine.repair_ranks(ladder_id).await
}
