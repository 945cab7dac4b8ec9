use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod middleware;
mod routes;
mod services;

use services::{storage::AttachmentStore, token::TokenIssuer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showcase_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env();

    // Ensure upload directory exists
    let storage = AttachmentStore::new(&config.upload_dir, config.max_upload_bytes);
    storage.init().await?;

    // Initialize database
    let db = db::Database::connect(&config.database_url).await?;
    db.run_migrations().await?;

    if let Some(admin) = &config.admin {
        services::users::ensure_admin(&db.pool, &admin.name, &admin.email, &admin.password)
            .await?;
    }

    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        chrono::Duration::hours(config.token_ttl_hours),
    );

    // Build application state
    let state = AppState {
        db,
        config: config.clone(),
        tokens,
        storage,
    };

    let app = routes::app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    pub config: config::Config,
    pub tokens: TokenIssuer,
    pub storage: AttachmentStore,
}
