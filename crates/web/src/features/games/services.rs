use chrono::Utc;
use storage::{
    dto::{common::PaginationParams, game::ReportGameRequest},
    error::LadderResult,
    models::Game,
};
use uuid::Uuid;

use crate::state::Engine;

/// One page of the ladder's games in play order, plus the total count
pub async fn list_games(
    engine: &Engine,
    ladder_id: Uuid,
    pagination: &PaginationParams,
) -> LadderResult<(Vec<Game>, i64)> {
    let games = engine.games(ladder_id).await?;
    let total = games.len() as i64;

    Ok((pagination.slice(games), total))
}

/// Record a finished game
pub async fn report_game(
    engine: &Engine,
    ladder_id: Uuid,
    request: ReportGameRequest,
) -> LadderResult<Game> {
    engine
        .report_game(request.into_report(ladder_id, Utc::now()))
        .await
}
