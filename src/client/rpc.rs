//! RPC client for the game server

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::game::geometry::Vec2;
use crate::rpc::protocol::{
    JoinRequest, JoinResponse, LeaveRequest, LeaveResponse, MapDefinition, ShootRequest,
    ShootResponse, UpdateRequest, UpdateResponse,
};

/// Client-side errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Server unreachable or returned a transport-level failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered but refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Thin JSON-over-HTTP client for the session RPCs
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Join and return the map; a refused join is an error
    pub async fn join(&self, player_id: &str) -> Result<MapDefinition, ClientError> {
        let response: JoinResponse = self
            .call(
                "join",
                &JoinRequest {
                    player_id: player_id.to_string(),
                },
            )
            .await?;

        match (response.success, response.map) {
            (true, Some(map)) => Ok(map),
            (true, None) => Err(ClientError::Rejected("join response carried no map".to_string())),
            (false, _) => Err(ClientError::Rejected(response.message)),
        }
    }

    pub async fn leave(&self, player_id: &str) -> Result<LeaveResponse, ClientError> {
        self.call(
            "leave",
            &LeaveRequest {
                player_id: player_id.to_string(),
            },
        )
        .await
    }

    pub async fn update(
        &self,
        client_id: &str,
        position: Vec2,
        direction: f32,
    ) -> Result<UpdateResponse, ClientError> {
        self.call(
            "update",
            &UpdateRequest {
                client_id: client_id.to_string(),
                position,
                direction,
            },
        )
        .await
    }

    /// Returns whether the server accepted the shot
    pub async fn shoot(&self, player_id: &str) -> Result<bool, ClientError> {
        let response: ShootResponse = self
            .call(
                "shoot",
                &ShootRequest {
                    player_id: player_id.to_string(),
                },
            )
            .await?;
        Ok(response.success)
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}/rpc/{}", self.base_url, method))
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
