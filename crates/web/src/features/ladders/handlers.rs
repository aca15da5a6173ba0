use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use storage::{
    dto::ladder::{CreateLadderRequest, LadderResponse},
    engine::{CrunchSummary, Standing},
};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

/// Outcome of a rank repair
#[derive(Debug, Serialize, ToSchema)]
pub struct RepairResponse {
    pub ladder_id: Uuid,
    pub rankings_repaired: usize,
}

#[utoipa::path(
    get,
    path = "/api/ladders",
    responses(
        (status = 200, description = "List all ladders successfully", body = Vec<LadderResponse>)
    ),
    tag = "ladders"
)]
pub async fn list_ladders(State(state): State<AppState>) -> Result<Response, WebError> {
    let ladders = services::list_ladders(&state.engine).await?;

    let response: Vec<LadderResponse> = ladders.into_iter().map(LadderResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ladders/{ladder_id}",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id")
    ),
    responses(
        (status = 200, description = "Ladder found", body = LadderResponse),
        (status = 404, description = "Ladder not found")
    ),
    tag = "ladders"
)]
pub async fn get_ladder(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let ladder = services::get_ladder(&state.engine, ladder_id).await?;

    Ok(Json(LadderResponse::from(ladder)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/ladders",
    request_body = CreateLadderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Ladder created successfully", body = LadderResponse),
        (status = 400, description = "Validation error or bad algorithm parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Unknown rating algorithm")
    ),
    tag = "ladders"
)]
pub async fn create_ladder(
    State(state): State<AppState>,
    Json(req): Json<CreateLadderRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_dates()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let ladder = services::create_ladder(&state.engine, req).await?;

    Ok((StatusCode::CREATED, Json(LadderResponse::from(ladder))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ladders/{ladder_id}/standings",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id")
    ),
    responses(
        (status = 200, description = "Active members in rank order", body = Vec<Standing>),
        (status = 409, description = "Unknown ladder")
    ),
    tag = "ladders"
)]
pub async fn get_standings(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let standings = services::standings(&state.engine, ladder_id).await?;

    Ok(Json(standings).into_response())
}

#[utoipa::path(
    post,
    path = "/api/ladders/{ladder_id}/crunch",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ratings rebuilt from the game log", body = CrunchSummary),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Ladder busy")
    ),
    tag = "ladders"
)]
pub async fn crunch_ratings(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let summary = services::crunch(&state.engine, ladder_id).await?;

    Ok(Json(summary).into_response())
}

#[utoipa::path(
    post,
    path = "/api/ladders/{ladder_id}/repair",
    params(
        ("ladder_id" = Uuid, Path, description = "Ladder id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ranks renumbered", body = RepairResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Ladder busy")
    ),
    tag = "ladders"
)]
pub async fn repair_ranks(
    State(state): State<AppState>,
    Path(ladder_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let rankings_repaired = services::repair(&state.engine, ladder_id).await?;

    Ok(Json(RepairResponse {
        ladder_id,
        rankings_repaired,
    })
    .into_response())
}
