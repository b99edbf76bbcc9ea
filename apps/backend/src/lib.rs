pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::identity::{self, TokenVerifier};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub auth_timeout: Duration,
    /// Return internal error detail to clients (never in production)
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(db: Database, verifier: Arc<dyn TokenVerifier>, auth_timeout: Duration) -> Self {
        Self {
            db: Arc::new(db),
            verifier,
            auth_timeout,
            expose_errors: false,
        }
    }

    pub fn with_exposed_errors(mut self, expose: bool) -> Self {
        self.expose_errors = expose;
        self
    }
}

/// Build the router with all routes. Bearer-protected routes sit behind
/// the auth middleware; catalog and progress snapshots are public.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Identity routes
        .route("/api/auth/verify", post(routes::auth::verify))
        .route(
            "/api/user/progress",
            get(routes::progress::mine).delete(routes::progress::reset),
        )
        .route(
            "/api/user/progress/complete",
            post(routes::progress::complete),
        )
        // Writing routes
        .route("/api/writing/save", post(routes::writing::save))
        .route("/api/writing/my-work", get(routes::writing::my_work))
        .route("/api/writing/{id}", delete(routes::writing::delete))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(routes::health::root))
        .route("/api/health", get(routes::health::health))
        // Topic routes
        .route(
            "/api/topics",
            get(routes::topics::list).post(routes::topics::create),
        )
        .route("/api/topics/progress", get(routes::progress::catalog))
        .route(
            "/api/topics/{id}",
            get(routes::topics::get)
                .put(routes::topics::update)
                .delete(routes::topics::delete),
        )
        // Progress routes
        .route("/api/progress/{user_id}", get(routes::progress::for_user))
        .merge(protected_routes)
        .fallback(routes::health::not_found)
        .layer(middleware::map_response_with_state(
            state.clone(),
            error::reveal_internal_detail,
        ))
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let verifier: Arc<dyn TokenVerifier> = Arc::from(identity::verifier_from_config(&config.auth));
    let state = AppState::new(db, verifier, config.auth.verify_timeout)
        .with_exposed_errors(!config.environment.is_production());

    let app = build_router(state.clone()).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr = config.server.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Closing database connections...");
    state.db.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
