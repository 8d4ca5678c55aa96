//! Application startup and lifecycle management.

use crate::backends::{AwsBackendFactory, BackendFactory};
use crate::config::CompanionConfig;
use crate::error::GatewayError;
use crate::handlers::{auth, features, health};
use crate::pool::ClientPool;
use crate::security::{access_control_middleware, AccessGate};
use crate::services::FeatureServices;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, request_span, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state. Built once, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CompanionConfig>,
    pub pool: Arc<ClientPool>,
    pub features: Arc<FeatureServices>,
    pub gate: Arc<AccessGate>,
}

impl AppState {
    /// Build the client pool, feature façades and access gate. A failure
    /// here, including a malformed password hash, aborts startup before any
    /// port is bound.
    pub fn build(
        config: CompanionConfig,
        factory: &dyn BackendFactory,
    ) -> Result<Self, GatewayError> {
        let pool = ClientPool::build(&config, factory)?;
        let features = FeatureServices::build(&config, &pool)?;
        let gate = AccessGate::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
            features: Arc::new(features),
            gate: Arc::new(gate),
        })
    }
}

async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("No such resource"))
}

/// Routes plus the middleware stack. The access gate sits innermost so that
/// rejections still carry the request id and security headers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(health::HEALTH_PATH, get(health::health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::current_session))
        .route("/auth/logout", post(auth::logout))
        .route("/api/features", get(features::list_features))
        .route("/api/translations", post(features::translate))
        .route("/api/test-generations", post(features::generate_tests))
        .fallback(not_found)
        .layer(from_fn_with_state(
            state.gate.clone(),
            access_control_middleware,
        ))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build against the real AWS runtimes.
    pub async fn build(config: CompanionConfig) -> Result<Self, AppError> {
        let factory = AwsBackendFactory::load(&config).await.map_err(|e| {
            tracing::error!("Failed to initialize AWS SDK: {}", e);
            e
        })?;

        Self::build_with_factory(config, &factory).await
    }

    pub async fn build_with_factory(
        config: CompanionConfig,
        factory: &dyn BackendFactory,
    ) -> Result<Self, AppError> {
        let port = config.common.port;
        let environment = config.common.environment;

        let state = AppState::build(config, factory).map_err(|e| {
            tracing::error!("Failed to build application state: {}", e);
            e
        })?;

        // Port 0 picks a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            environment = %environment,
            "CodeGuru Context Companion listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until SIGINT/SIGTERM, purging idle sessions in the background.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let purge = tokio::spawn(purge_sessions(self.state.gate.clone()));
        let router = build_router(self.state);

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        purge.abort();
        result
    }
}

async fn purge_sessions(gate: Arc<AccessGate>) {
    let period = (gate.sessions().idle_timeout() / 2)
        .clamp(Duration::from_secs(1), Duration::from_secs(60));
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        let purged = gate.sessions().purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "Purged idle sessions");
        }
        metrics::gauge!("active_sessions").set(gate.sessions().active_count() as f64);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
