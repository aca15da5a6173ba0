use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::handlers::{
    apply_penalty, get_member, get_rating_history, join_ladder, leave_ladder, rejoin_ladder,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/:ladder_id/members", post(join_ladder))
        .route("/:ladder_id/members/:player_id", delete(leave_ladder))
        .route("/:ladder_id/members/:player_id/rejoin", post(rejoin_ladder))
        .route("/:ladder_id/members/:player_id/penalty", post(apply_penalty))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:ladder_id/members/:player_id", get(get_member))
        .route("/:ladder_id/members/:player_id/ratings", get(get_rating_history))
        .merge(protected)
}
