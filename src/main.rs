use recipe_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{CredentialStoreState, PostgresRepository, RecipeStore, RecipeStoreState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup: configuration, logging, database, the auth and validation core, then the
/// HTTP server. Any failure before the listener is bound aborts the process.
#[tokio::main]
async fn main() {
    // 1. Configuration (Fail-Fast)
    dotenv::dotenv().ok();
    // Panics when JWT_SECRET or DATABASE_URL is missing, before anything else starts.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recipe_gate=debug,tower_http=info,axum=trace".into());

    // 3. Logging format by environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // One repository backs both store seams.
    let repo = Arc::new(PostgresRepository::new(pool));
    let credentials = repo.clone() as CredentialStoreState;
    let recipes = repo as RecipeStoreState;

    // 5. Keywords stored in the database join the configured ones.
    let stored_keywords = recipes
        .get_keywords()
        .await
        .expect("FATAL: Failed to load banned keywords from the database.");

    // 6. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::build(config, credentials, recipes, stored_keywords)
        .expect("FATAL: Failed to initialise the auth and validation core.");

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
