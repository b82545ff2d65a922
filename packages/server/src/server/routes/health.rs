use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::domains::reviews::ReviewRepository;
use crate::kernel::BaseWorkQueue;
use crate::server::app::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: DependencyHealth,
    queue: DependencyHealth,
}

#[derive(Serialize)]
pub struct DependencyHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DependencyHealth {
    fn from_check<E: std::fmt::Display>(
        result: Result<Result<(), E>, tokio::time::error::Elapsed>,
    ) -> Self {
        match result {
            Ok(Ok(())) => Self {
                status: "ok".to_string(),
                error: None,
            },
            Ok(Err(e)) => Self {
                status: "error".to_string(),
                error: Some(format!("Check failed: {}", e)),
            },
            Err(_) => Self {
                status: "error".to_string(),
                error: Some(format!("Check timeout (>{}s)", CHECK_TIMEOUT.as_secs())),
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Health check endpoint
///
/// Checks:
/// - Review store connectivity
/// - Queue store connectivity
///
/// Returns 200 OK if both are reachable, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database =
        DependencyHealth::from_check(tokio::time::timeout(CHECK_TIMEOUT, state.deps.reviews.ping()).await);
    let queue =
        DependencyHealth::from_check(tokio::time::timeout(CHECK_TIMEOUT, state.deps.queue.ping()).await);

    let is_healthy = database.is_ok() && queue.is_ok();

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            database,
            queue,
        }),
    )
}
