use storage::{
    dto::member::JoinLadderRequest,
    engine::{Demotion, MemberStatus},
    error::LadderResult,
    models::{Ranking, Rating},
};
use uuid::Uuid;

use crate::state::Engine;

pub async fn join(engine: &Engine, ladder_id: Uuid, request: &JoinLadderRequest) -> LadderResult<Ranking> {
    engine
        .join_ladder(request.player_id, ladder_id, request.initial_rating)
        .await
}

pub async fn status(engine: &Engine, ladder_id: Uuid, player_id: Uuid) -> LadderResult<MemberStatus> {
    engine.member_status(player_id, ladder_id).await
}

pub async fn rating_history(engine: &Engine, ladder_id: Uuid, player_id: Uuid) -> LadderResult<Vec<Rating>> {
    engine.rating_history(player_id, ladder_id).await
}

pub async fn leave(engine: &Engine, ladder_id: Uuid, player_id: Uuid) -> LadderResult<()> {
    engine.leave_ladder(player_id, ladder_id).await
}

pub async fn rejoin(engine: &Engine, ladder_id: Uuid, player_id: Uuid) -> LadderResult<i32> {
    engine.rejoin_ladder(player_id, ladder_id).await
}

/// Apply one inactivity demotion
pub async fn penalize(engine: &Engine, ladder_id: Uuid, player_id: Uuid) -> LadderResult<Demotion> {
    engine.apply_inactivity_penalty(player_id, ladder_id).await
}
