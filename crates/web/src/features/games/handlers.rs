use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::{
    common::{PaginatedResponse, PaginationParams},
    game::{GameResponse, ReportGameRequest},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/ladders/{ladder_id}/games",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Games in play order", body = PaginatedResponse<GameResponse>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "games"
)]
pub async fn list_games(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;

    let (games, total_items) = services::list_games(&state.engine, ladder_id, &pagination).await?;

    let response = PaginatedResponse::new(
        games.into_iter().map(GameResponse::from).collect(),
        pagination.page,
        pagination.page_size,
        total_items,
    );

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/ladders/{ladder_id}/games",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id")
    ),
    request_body = ReportGameRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Game recorded, ratings and ranks updated", body = GameResponse),
        (status = 400, description = "Self-play, unranked player or date outside the ladder window"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Ladder busy")
    ),
    tag = "games"
)]
pub async fn report_game(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
    Json(req): Json<ReportGameRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let game = services::report_game(&state.engine, ladder_id, req).await?;

    Ok((StatusCode::CREATED, Json(GameResponse::from(game))).into_response())
}
