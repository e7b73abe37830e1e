//! carmeet server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use carmeet_api::{middleware::AppState, router as api_router};
use carmeet_cache::RedisCacheInvalidator;
use carmeet_common::Config;
use carmeet_core::{
    CacheInvalidatorService, CarLikeService, CounterMaintenanceService, EventAttendanceService,
    FollowingService, InvalidationDispatcher, NoOpInvalidator, RelationshipStore,
    SeaOrmCounterStore, UserService,
};
use carmeet_db::repositories::{
    CarLikeRepository, CarRepository, EventAttendeeRepository, EventRepository,
    FollowingRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

/// Pick the cache invalidator: Redis when enabled and reachable, otherwise a no-op.
async fn cache_invalidator(config: &Config) -> CacheInvalidatorService {
    if !config.cache.enabled {
        info!("Cache invalidation disabled");
        return Arc::new(NoOpInvalidator);
    }

    match RedisCacheInvalidator::connect(config).await {
        Ok(invalidator) => Arc::new(invalidator),
        Err(e) => {
            warn!(error = %e, "Redis unavailable, cached views will not be invalidated");
            Arc::new(NoOpInvalidator)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carmeet=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting carmeet server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(carmeet_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    carmeet_db::migrate(&db).await?;
    info!("Migrations completed");

    let invalidation = InvalidationDispatcher::new(cache_invalidator(&config).await);
    let mode = config.counters.mode;
    info!(?mode, "Counter maintenance mode");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let likes: Arc<dyn RelationshipStore> = Arc::new(CarLikeRepository::new(Arc::clone(&db)));
    let follows: Arc<dyn RelationshipStore> = Arc::new(FollowingRepository::new(Arc::clone(&db)));
    let attendees: Arc<dyn RelationshipStore> =
        Arc::new(EventAttendeeRepository::new(Arc::clone(&db)));
    let counters = Arc::new(SeaOrmCounterStore::new(
        CarRepository::new(Arc::clone(&db)),
        user_repo.clone(),
        EventRepository::new(Arc::clone(&db)),
    ));

    // Initialize services
    let state = AppState {
        identity: Arc::new(UserService::new(user_repo)),
        car_like_service: CarLikeService::new(
            likes.clone(),
            counters.clone(),
            invalidation.clone(),
            mode,
        ),
        following_service: FollowingService::new(
            follows.clone(),
            counters.clone(),
            invalidation.clone(),
            mode,
        ),
        event_attendance_service: EventAttendanceService::new(
            attendees.clone(),
            counters.clone(),
            invalidation.clone(),
            mode,
        ),
        counter_maintenance_service: CounterMaintenanceService::new(
            likes,
            follows,
            attendees,
            counters,
            invalidation,
        ),
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            carmeet_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
