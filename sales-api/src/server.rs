use std::sync::Arc;

use axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::header,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    BoxError, Json, Router,
};
use tokio::net::TcpListener;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;

use crate::api;
use crate::config::Config;
use crate::domain::services::auth_service::Authenticator;
use crate::domain::services::product_service::ProductService;
use crate::domain::services::user_service::UserService;
use crate::error::AppError;
use crate::infrastructure::database::{self, Store};
use crate::middleware::{context, logging, metrics, recover};
use crate::middleware::metrics::{ApiMetrics, MetricsSnapshot};
use crate::shutdown::{self, Shutdown};

/// Everything a handler can reach. Built once at startup.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub products: ProductService,
    pub users: UserService,
    pub authenticator: Authenticator,
    pub metrics: ApiMetrics,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        authenticator: Authenticator,
        shutdown: Shutdown,
    ) -> Result<Self, AppError> {
        Ok(Self {
            products: ProductService::new(store.clone()),
            users: UserService::new(store.clone()),
            config,
            store,
            authenticator,
            metrics: ApiMetrics::new()?,
            shutdown,
        })
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    with_pipeline(api::routes(state.clone()), state)
}

/// Wraps `router` in the shared pipeline, outermost stage first. Panics and
/// timeouts are turned into responses below the logging and metrics stages,
/// so both see the final status.
pub fn with_pipeline(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    router
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.shutdown.clone(), context::seed_context))
                .layer(from_fn(logging::log_request))
                .layer(from_fn_with_state(state.metrics.clone(), metrics::track_metrics))
                .layer(CatchPanicLayer::custom(recover::panic_response))
                .layer(HandleErrorLayer::new(handle_pipeline_error))
                .layer(TimeoutLayer::new(state.config.web.request_timeout())),
        )
        .with_state(state)
}

async fn handle_pipeline_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(format!("unhandled pipeline error: {err}"))
    }
}

/// Operator listener, kept off the public address.
pub fn create_debug_app(metrics: ApiMetrics) -> Router {
    Router::new()
        .route("/debug/vars", get(debug_vars))
        .route("/metrics", get(prometheus_metrics))
        .with_state(metrics)
}

async fn debug_vars(State(metrics): State<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

async fn prometheus_metrics(State(metrics): State<ApiMetrics>) -> Result<impl IntoResponse, AppError> {
    let body = metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// Serves the API and debug listeners until shutdown is requested, then
/// drains in-flight requests for at most `web.shutdown_timeout`.
pub async fn run(config: Config) -> Result<(), AppError> {
    tracing::info!(config = ?config, "Starting sales API");

    let store = database::connect(&config.db)?;
    let authenticator = Authenticator::from_config(&config.auth)?;
    let shutdown = Shutdown::new();

    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        authenticator,
        shutdown.clone(),
    )?);

    let api_listener = TcpListener::bind(&config.web.address).await?;
    let debug_listener = TcpListener::bind(&config.web.debug_address).await?;
    tracing::info!(address = %config.web.address, "API listening");
    tracing::info!(address = %config.web.debug_address, "Debug listening");

    tokio::spawn(shutdown::watch_signals(shutdown.clone()));

    let debug_server = axum::serve(debug_listener, create_debug_app(state.metrics.clone()))
        .with_graceful_shutdown(shutdown.clone().requested());
    let debug = tokio::spawn(async move {
        if let Err(err) = debug_server.await {
            tracing::error!(error = %err, "debug listener failed");
        }
    });

    let api_server = axum::serve(api_listener, create_app(state))
        .with_graceful_shutdown(shutdown.clone().requested());
    let api = async move { api_server.await };
    tokio::pin!(api);

    tokio::select! {
        result = &mut api => result?,
        _ = shutdown.clone().requested() => {
            tracing::info!(timeout = ?config.web.shutdown_timeout(), "Draining in-flight requests");
            match tokio::time::timeout(config.web.shutdown_timeout(), &mut api).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!("Shutdown timeout elapsed, abandoning in-flight requests"),
            }
        }
    }

    debug.abort();

    if shutdown.is_integrity_fault() {
        return Err(AppError::IntegrityFault(
            "request pipeline reported an integrity fault".to_string(),
        ));
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
