use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::member::{JoinLadderRequest, RankResponse, RatingResponse},
    engine::MemberStatus,
    models::Ranking,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/ladders/{ladder_id}/members",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id")
    ),
    request_body = JoinLadderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Player joined at the bottom of the ladder", body = Ranking),
        (status = 400, description = "Unknown player, duplicate membership or negative rating"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "members"
)]
pub async fn join_ladder(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
    Json(req): Json<JoinLadderRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let ranking = services::join(&state.engine, ladder_id, &req).await?;

    Ok((StatusCode::CREATED, Json(ranking)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ladders/{ladder_id}/members/{player_id}",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    responses(
        (status = 200, description = "Current rank and rating", body = MemberStatus),
        (status = 409, description = "Player holds no ranking on the ladder")
    ),
    tag = "members"
)]
pub async fn get_member(
    State(state): State<AppState>,
    Path((ladder_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let status = services::status(&state.engine, ladder_id, player_id).await?;

    Ok(Json(status).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ladders/{ladder_id}/members/{player_id}/ratings",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    responses(
        (status = 200, description = "Rating history, oldest first", body = Vec<RatingResponse>),
        (status = 409, description = "Player holds no ranking on the ladder")
    ),
    tag = "members"
)]
pub async fn get_rating_history(
    State(state): State<AppState>,
    Path((ladder_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let ratings = services::rating_history(&state.engine, ladder_id, player_id).await?;

    let response: Vec<RatingResponse> = ratings.into_iter().map(RatingResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/ladders/{ladder_id}/members/{player_id}",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Player left; ranks below moved up"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Player not ranked or already inactive")
    ),
    tag = "members"
)]
pub async fn leave_ladder(
    State(state): State<AppState>,
    Path((ladder_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    services::leave(&state.engine, ladder_id, player_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/ladders/{ladder_id}/members/{player_id}/rejoin",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Player active again at the bottom", body = RankResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Player already active or not a member")
    ),
    tag = "members"
)]
pub async fn rejoin_ladder(
    State(state): State<AppState>,
    Path((ladder_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let rank = services::rejoin(&state.engine, ladder_id, player_id).await?;

    Ok(Json(RankResponse {
        player_id,
        ladder_id,
        rank: Some(rank),
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/ladders/{ladder_id}/members/{player_id}/penalty",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id"),
        ("player_id" = Uuid, Path, description = "Player id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Player demoted by one place (unless already last)", body = RankResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Player not active on the ladder")
    ),
    tag = "members"
)]
pub async fn apply_penalty(
    State(state): State<AppState>,
    Path((ladder_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, WebError> {
    let demotion = services::penalize(&state.engine, ladder_id, player_id).await?;

    Ok(Json(RankResponse {
        player_id,
        ladder_id,
        rank: Some(demotion.rank_after),
    })
    .into_response())
}
