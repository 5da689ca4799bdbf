//! RPC handlers: translate client intents into world mutations

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::app::AppState;
use crate::http::routes::AppError;
use crate::rpc::protocol::{
    JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, ShootRequest, ShootResponse,
    UpdateRequest, UpdateResponse,
};

/// Join the game and receive the map
pub async fn join_handler(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    if req.player_id.trim().is_empty() {
        return Err(AppError::BadRequest("player_id must not be empty".to_string()));
    }

    info!(player_id = %req.player_id, "Join requested");

    let response = match state.world.join(&req.player_id) {
        Ok(map) => JoinResponse {
            success: true,
            message: "Successfully joined the game!".to_string(),
            map: Some(map),
        },
        Err(e) => {
            warn!(player_id = %req.player_id, error = %e, "Join rejected");
            JoinResponse {
                success: false,
                message: e.to_string(),
                map: None,
            }
        }
    };

    Ok(Json(response))
}

/// Leave the game
pub async fn leave_handler(
    State(state): State<AppState>,
    Json(req): Json<LeaveRequest>,
) -> Json<LeaveResponse> {
    let response = match state.world.leave(&req.player_id) {
        Ok(()) => {
            state.rate_limiter.prune();
            LeaveResponse {
                success: true,
                message: "Successfully left the game!".to_string(),
            }
        }
        Err(e) => {
            warn!(player_id = %req.player_id, error = %e, "Leave rejected");
            LeaveResponse {
                success: false,
                message: e.to_string(),
            }
        }
    };

    Json(response)
}

/// Heartbeat: store the caller's position and return the world snapshot
pub async fn update_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    if !state.rate_limiter.check(&req.client_id) {
        warn!(player_id = %req.client_id, "Rate limited update");
        return Err(AppError::TooManyRequests);
    }

    Ok(Json(
        state
            .world
            .update(&req.client_id, req.position, req.direction),
    ))
}

/// Fire a bullet along the player's facing angle
pub async fn shoot_handler(
    State(state): State<AppState>,
    Json(req): Json<ShootRequest>,
) -> Result<Json<ShootResponse>, AppError> {
    if !state.rate_limiter.check(&req.player_id) {
        warn!(player_id = %req.player_id, "Rate limited shot");
        return Err(AppError::TooManyRequests);
    }

    let success = match state.world.shoot(&req.player_id) {
        Ok(_) => true,
        Err(e) => {
            warn!(player_id = %req.player_id, error = %e, "Shot rejected");
            false
        }
    };

    Ok(Json(ShootResponse { success }))
}
