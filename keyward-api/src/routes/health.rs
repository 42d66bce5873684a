/// Health check endpoint
///
/// Returns service status and store connectivity. Public, no authentication.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use keyward_shared::db::store::Store;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// API version
    pub version: String,

    /// Store connection status
    pub database: String,
}

/// Health check handler
///
/// Answers 503 with `"degraded"` when the store cannot be reached.
pub async fn health_check<S: Store>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    let connected = match state.services.store().ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(error = %err, "Store health check failed");
            false
        }
    };

    let (code, status, database) = if connected {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}
