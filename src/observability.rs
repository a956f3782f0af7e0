use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::state::AppState;

/// Application health status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthChecks {
    pub api: String,
    pub database: String,
}

/// Application metrics
#[derive(Debug, Clone)]
pub struct AppMetrics {
    pub start_time: Instant,
    pub total_requests: Arc<RwLock<u64>>,
    pub successful_requests: Arc<RwLock<u64>>,
    pub failed_requests: Arc<RwLock<u64>>,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: Arc::new(RwLock::new(0)),
            successful_requests: Arc::new(RwLock::new(0)),
            failed_requests: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn increment_requests(&self) {
        *self.total_requests.write().await += 1;
    }

    pub async fn increment_success(&self) {
        *self.successful_requests.write().await += 1;
    }

    pub async fn increment_failure(&self) {
        *self.failed_requests.write().await += 1;
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts every request and classifies it by response status.
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.metrics.increment_requests().await;
    let response = next.run(req).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        state.metrics.increment_failure().await;
    } else {
        state.metrics.increment_success().await;
    }
    response
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database reachable", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = HealthStatus)
    ),
    tag = "Operations"
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.metrics.uptime_seconds();

    // Must answer before the request timeout fires, or the client sees a bare 408.
    let deadline = state.config.request_timeout / 2;
    let (status, database) = match tokio::time::timeout(deadline, state.store.ping()).await {
        Ok(Ok(())) => (StatusCode::OK, "ok"),
        Ok(Err(e)) => {
            warn!("Health check database ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
        Err(_) => {
            warn!("Health check database ping timed out after {:?}", deadline);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    let health = HealthStatus {
        status: if status.is_success() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        checks: HealthChecks {
            api: "ok".to_string(),
            database: database.to_string(),
        },
    };

    info!(
        "Health check requested - status: {}, uptime: {}s",
        health.status, uptime
    );
    (status, Json(health))
}

/// Metrics endpoint handler
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, description = "Request counters", body = MetricsResponse)),
    tag = "Operations"
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = &state.metrics;
    let uptime = metrics.uptime_seconds();
    let total = *metrics.total_requests.read().await;
    let success = *metrics.successful_requests.read().await;
    let failed = *metrics.failed_requests.read().await;

    let success_rate = if total > 0 {
        (success as f64 / total as f64) * 100.0
    } else {
        100.0
    };

    let response = MetricsResponse {
        uptime_seconds: uptime,
        total_requests: total,
        successful_requests: success,
        failed_requests: failed,
        success_rate,
    };

    (StatusCode::OK, Json(response))
}

/// Initialize tracing subscriber for structured logging
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "bookstore=info,tower_http=info".to_string());

    let filter_clone = filter.clone();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .json()
        .init();

    info!("Tracing initialized with filter: {}", filter_clone);
}
