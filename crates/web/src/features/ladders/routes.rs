use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    create_ladder, crunch_ratings, get_ladder, get_standings, list_ladders, repair_ranks,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_ladder))
        .route("/:ladder_id/crunch", post(crunch_ratings))
        .route("/:ladder_id/repair", post(repair_ranks))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_ladders))
        .route("/:ladder_id", get(get_ladder))
        .route("/:ladder_id/standings", get(get_standings))
        .merge(protected)
}
