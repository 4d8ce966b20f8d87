//! Mediarium server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use apalis::prelude::*;
use axum::{extract::DefaultBodyLimit, middleware};
use fred::interfaces::ClientLike;
use mediarium_api::{router as api_router, session_middleware, AppState};
use mediarium_common::{Config, MediaStore, SessionStore};
use mediarium_core::{
    DerivationQueue, LibraryService, MediaProbe, MediaService, TagService, UserService,
};
use mediarium_db::repositories::{
    CollectionRepository, DerivationJobRepository, MediaRepository, TagRepository, UserRepository,
};
use mediarium_queue::{derive_worker, DeriveContext, DeriveJob, RedisDerivationService};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediarium=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting mediarium server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = mediarium_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    mediarium_db::migrate(&db).await?;
    info!("Migrations completed");

    // Prepare the storage layout
    let store = MediaStore::new(&config.storage.root);
    store.ensure_layout().await?;
    info!(root = %config.storage.root.display(), "Storage layout ready");

    // Connect to Redis for the derivation job queue
    info!("Connecting to Redis...");
    let redis_client =
        redis::Client::open(config.redis.url.as_str()).expect("Failed to create Redis client");
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .expect("Failed to connect to Redis");
    let redis_storage = apalis_redis::RedisStorage::<DeriveJob>::new(redis_conn);
    info!("Connected to Redis job queue");

    // Fred client for the session store
    let fred_config = fred::types::config::Config::from_url(&config.redis.url)
        .expect("Failed to parse Redis URL for sessions");
    let fred_client = fred::clients::Client::new(fred_config, None, None, None);
    fred_client.connect();
    fred_client
        .wait_for_connect()
        .await
        .expect("Failed to connect fred client to Redis");
    let fred_client = Arc::new(fred_client);
    info!("Connected to Redis session store");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));
    let collection_repo = CollectionRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let job_repo = DerivationJobRepository::new(Arc::clone(&db));

    // Derivation queue
    let derivation: DerivationQueue =
        Arc::new(RedisDerivationService::new(redis_storage.clone()));

    // Initialize services
    let probe = MediaProbe::new(Duration::from_secs(config.storage.probe_timeout_secs));
    let user_service = UserService::new(user_repo.clone());
    let media_service = MediaService::new(
        media_repo.clone(),
        tag_repo.clone(),
        job_repo.clone(),
        probe,
        store.clone(),
        derivation,
    );
    let library_service =
        LibraryService::new(media_repo.clone(), collection_repo, user_repo.clone());
    let tag_service = TagService::new(tag_repo);

    let sessions = SessionStore::new(fred_client, config.redis.prefix.clone());

    let state = AppState {
        user_service,
        media_service,
        library_service,
        tag_service,
        sessions,
        store: store.clone(),
    };

    // Build the router
    let app = api_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(DefaultBodyLimit::max(config.storage.max_upload_bytes as usize))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the derivation worker
    {
        let derive_ctx = DeriveContext::new(job_repo, store);
        tokio::spawn(async move {
            let monitor = Monitor::new().register({
                WorkerBuilder::new("derive")
                    .data(derive_ctx)
                    .backend(redis_storage)
                    .build_fn(derive_worker)
            });

            if let Err(e) = monitor.run().await {
                tracing::error!(error = %e, "Derivation worker failed");
            }
        });
        info!("Derivation worker started");
    }

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
