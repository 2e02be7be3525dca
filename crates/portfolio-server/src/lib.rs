//! Portfolio Site Server Library
//!
//! JSON API for a portfolio site: blog posts, services, media, projects,
//! experience, a contact inbox, newsletter subscriptions and site settings,
//! with cookie-based admin sessions. Documents live in MongoDB, or in JSON
//! files for local development.

pub mod auth;
pub mod config;
pub mod cors;
pub mod ctx;
pub mod error;
pub mod handlers;
pub mod models;
pub mod response;
pub mod router;
pub mod store;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppState, SiteConfig, StoreBackend};
use models::{Entity, Post, Project, Subscriber, User};
use store::{DocumentStore, JsonDocumentStore, MongoDocumentStore};

pub use router::router;

/// Open the configured document store
pub async fn connect_store(config: &SiteConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match &config.backend {
        StoreBackend::Mongo { uri, database } => {
            info!("Using MongoDB database {}", database);
            Ok(Arc::new(MongoDocumentStore::new(uri.clone(), database.clone())))
        }
        StoreBackend::Json { dir } => Ok(Arc::new(JsonDocumentStore::new(dir.clone()).await?)),
    }
}

/// Declare the unique indexes. Failures are logged, not fatal; the
/// repositories still check uniqueness before writing.
pub async fn ensure_indexes(store: &dyn DocumentStore) {
    let indexes = [
        (User::COLLECTION, "email"),
        (Subscriber::COLLECTION, "email"),
        (Post::COLLECTION, "slug"),
        (Project::COLLECTION, "slug"),
    ];
    for (collection, field) in indexes {
        if let Err(e) = store.ensure_unique_index(collection, field).await {
            warn!("Could not ensure unique index {}.{}: {:#}", collection, field, e);
        }
    }
}

/// Connect the store and assemble shared state
pub async fn build_state(config: SiteConfig) -> anyhow::Result<AppState> {
    let store = connect_store(&config).await?;
    ensure_indexes(store.as_ref()).await;
    Ok(AppState::new(config, store))
}

/// Serve the API on `listener` until shutdown is signalled
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .ok();

    info!("=== Portfolio Server ===");

    let config = SiteConfig::from_env()?;
    let addr = config.addr;
    info!("Allowed origins: {}", config.allowed_origins.join(", "));

    let state = build_state(config).await?;

    let listener = TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);

    serve(listener, state).await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
