use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{list_games, report_game};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/:ladder_id/games", post(report_game))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:ladder_id/games", get(list_games))
        .merge(protected)
}
