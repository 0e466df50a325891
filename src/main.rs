//! Kindred - a community backend with accounts, posts and compatibility preferences

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kindred::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCommentRepository, SqlxPostRepository, SqlxPreferencesRepository,
            SqlxProfileRepository, SqlxTagRepository, SqlxUserRepository,
        },
    },
    services::{AuthService, PostService, PreferencesService, TokenService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kindred=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kindred backend...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let profile_repo = SqlxProfileRepository::boxed(pool.clone());
    let prefs_repo = SqlxPreferencesRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let tag_repo = SqlxTagRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());

    // Initialize services
    let tokens = TokenService::new(&config.auth.secret, config.auth.token_ttl_minutes);
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        profile_repo.clone(),
        prefs_repo.clone(),
        tokens,
    ));
    let user_service = Arc::new(UserService::new(user_repo, profile_repo));
    let post_service = Arc::new(PostService::new(post_repo, tag_repo, comment_repo));
    let preferences_service = Arc::new(PreferencesService::new(prefs_repo));

    // Build application state
    let state = AppState {
        auth_service,
        user_service,
        post_service,
        preferences_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
