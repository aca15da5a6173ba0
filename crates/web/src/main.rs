use std::time::Duration;

use anyhow::Context;
use axum::Router;
use storage::{Database, LadderEngine, PgLadderStore};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::players::handlers::create_player,
        features::players::handlers::get_player,
        features::ladders::handlers::list_ladders,
        features::ladders::handlers::get_ladder,
        features::ladders::handlers::create_ladder,
        features::ladders::handlers::get_standings,
        features::ladders::handlers::crunch_ratings,
        features::ladders::handlers::repair_ranks,
        features::games::handlers::list_games,
        features::games::handlers::report_game,
        features::members::handlers::join_ladder,
        features::members::handlers::get_member,
        features::members::handlers::get_rating_history,
        features::members::handlers::leave_ladder,
        features::members::handlers::rejoin_ladder,
        features::members::handlers::apply_penalty,
    ),
    components(
        schemas(
            storage::dto::player::CreatePlayerRequest,
            storage::dto::player::PlayerResponse,
            storage::dto::ladder::CreateLadderRequest,
            storage::dto::ladder::LadderResponse,
            storage::dto::game::ReportGameRequest,
            storage::dto::game::GameResponse,
            storage::dto::member::JoinLadderRequest,
            storage::dto::member::RankResponse,
            storage::dto::member::RatingResponse,
            storage::dto::common::PaginationMeta,
            storage::engine::Standing,
            storage::engine::MemberStatus,
            storage::engine::CrunchSummary,
            storage::models::LadderKind,
            storage::models::GameResult,
            storage::models::Ranking,
            features::ladders::handlers::RepairResponse,
        )
    ),
    tags(
        (name = "players", description = "Player registration"),
        (name = "ladders", description = "Ladders, standings and maintenance"),
        (name = "games", description = "Game reporting"),
        (name = "members", description = "Ladder membership, ranks and ratings"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

fn app(state: AppState, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let ladders = features::ladders::routes(api_keys.clone())
        .merge(features::games::routes(api_keys.clone()))
        .merge(features::members::routes(api_keys.clone()));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/players", features::players::routes(api_keys))
        .nest("/api/ladders", ladders)
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting chess ladder API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let store = PgLadderStore::new(
        db.pool().clone(),
        Duration::from_millis(config.lock_timeout_ms),
    );
    let state = AppState::new(LadderEngine::new(store));

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, every mutating endpoint will answer 401");
    }

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);

    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app(state, api_keys)).await?;

    Ok(())
}
