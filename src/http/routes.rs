//! HTTP route definitions

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::rpc::handler::{join_handler, leave_handler, shoot_handler, update_handler};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Session RPCs share one permit pool, like a fixed-size worker pool
    let rpc_routes = Router::new()
        .route("/rpc/join", post(join_handler))
        .route("/rpc/leave", post(leave_handler))
        .route("/rpc/update", post(update_handler))
        .route("/rpc/shoot", post(shoot_handler))
        .layer(GlobalConcurrencyLimitLayer::new(
            state.config.max_concurrent_requests.max(1),
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(rpc_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    players: usize,
    max_players: usize,
    bullets: usize,
    tick: u64,
    snapshots_served: u64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.world.stats();

    Json(HealthResponse {
        status: if state.is_shutting_down() {
            "shutting_down"
        } else {
            "ok"
        },
        uptime_secs: uptime_secs(),
        players: stats.players,
        max_players: state.config.max_players,
        bullets: stats.bullets,
        tick: stats.tick,
        snapshots_served: stats.snapshots_served,
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Too many requests")]
    TooManyRequests,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}
