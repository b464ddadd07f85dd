//! Docs Annotation Backend
//!
//! A REST backend for annotations on documentation pages, with teams, votes
//! and moderation, persisted in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod policy;
mod render;
mod service;
mod store;
mod visibility;
mod votes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use render::MarkdownRenderer;
use store::Stores;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Docs Annotation Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        stores: Stores::from_shared(repo, Arc::new(MarkdownRenderer)),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let user_routes = Router::new()
        .route("/register", post(api::users::register))
        .route("/login", post(api::users::login))
        .route("/logout", post(api::users::logout))
        .route("/password", post(api::users::change_password))
        .route("/email", post(api::users::change_email));

    let entry_routes = Router::new()
        .route("/list", post(api::entries::list))
        .route("/save", post(api::entries::save))
        .route("/create", post(api::entries::save))
        .route("/get", post(api::entries::get))
        .route("/vote", post(api::entries::vote))
        .route("/delete", post(api::entries::delete))
        .route("/remove_from_public", post(api::entries::remove_from_public))
        .route("/remove_from_teams", post(api::entries::remove_from_teams));

    let team_routes = Router::new()
        .route("/list", post(api::teams::list))
        .route("/create", post(api::teams::create))
        .route("/join", post(api::teams::join))
        .route("/leave", post(api::teams::leave))
        .route("/set_role", post(api::teams::set_role))
        .route("/remove_member", post(api::teams::remove_member))
        .route("/set_access_key", post(api::teams::set_access_key))
        .route("/list_members", post(api::teams::list_members));

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/entries", entry_routes)
        .nest("/teams", team_routes);

    // Health check (no session needed)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
