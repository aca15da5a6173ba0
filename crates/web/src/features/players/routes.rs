use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{create_player, get_player};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_player))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:player_id", get(get_player))
        .merge(protected)
}
