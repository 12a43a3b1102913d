//! HTTP Surface
//!
//! JSON API over the assignment engine: the optimize endpoint plus health
//! and metrics, fronted by the trace/CORS/compression middleware the
//! service is deployed behind.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::model::{OptimizeRequest, OptimizeResponse, ValidationError};
use crate::optimizer;
use crate::Config;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub metrics: Metrics,
}

/// Assemble the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    let mut router = Router::new()
        .route("/optimize", post(optimize))
        .route("/health", get(health));

    if state.config.metrics_enabled {
        router = router.route("/metrics", get(metrics));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new();

    cors = if config.cors_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    cors = if config.cors_methods.iter().any(|m| m == "*") {
        cors.allow_methods(Any)
    } else {
        let methods: Vec<Method> = config
            .cors_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        cors.allow_methods(methods)
    };

    if config.cors_headers.iter().any(|h| h == "*") {
        cors.allow_headers(Any)
    } else {
        let headers: Vec<HeaderName> = config
            .cors_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors.allow_headers(headers)
    }
}

/// Failures surfaced by the API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": err.to_string(),
                    "type": "validation_error",
                })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!(error = %err, "unhandled failure in optimize path");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "detail": "Internal server error",
                        "type": "internal_error",
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// `POST /optimize` — validate, solve on a blocking worker, respond.
async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    state.metrics.requests.inc();
    request.validate()?;

    // The request may ask for less than the configured ceiling, never more.
    request.timeout_seconds = request.timeout_seconds.min(state.config.max_timeout_seconds);

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        orders = request.orders.len(),
        channels = request.channels.len(),
        timeout_seconds = request.timeout_seconds,
        "optimization request received"
    );

    // The solve is CPU-bound and can hold its thread for the full budget.
    let timer = state.metrics.solve_duration.start_timer();
    let result = tokio::task::spawn_blocking(move || optimizer::solve(&request)).await;
    timer.observe_duration();

    match result {
        Ok(response) => {
            state.metrics.success.inc();
            info!(
                %request_id,
                status = %response.status,
                solve_time_ms = response.solve_time_ms,
                total_score = response.total_score,
                "optimization request completed"
            );
            Ok(Json(response))
        }
        Err(join_error) => {
            state.metrics.errors.inc();
            Err(ApiError::Internal(anyhow::anyhow!(
                "solver task failed: {join_error}"
            )))
        }
    }
}

/// `GET /health`
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /metrics` — Prometheus text exposition.
async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
