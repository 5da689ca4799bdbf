//! End-to-end checks of the RPC surface through the axum router

use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, StatusCode},
    Router,
};
use futures::SinkExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

use arena_game_server::app::AppState;
use arena_game_server::config::Config;
use arena_game_server::game::WorldMap;
use arena_game_server::http::build_router;
use arena_game_server::rpc::protocol::{
    JoinResponse, LeaveResponse, ShootResponse, UpdateResponse,
};

fn app_with(config: Config) -> (Router, AppState) {
    let state = AppState::new(config, WorldMap::builtin());
    (build_router(state.clone()), state)
}

fn app() -> (Router, AppState) {
    app_with(Config::default())
}

async fn post(router: &Router, path: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call<T: DeserializeOwned>(router: &Router, path: &str, body: Value) -> T {
    let (status, bytes) = post(router, path, body).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn join_hands_out_the_map_once_per_id() {
    let (router, _) = app();

    let first: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;
    assert!(first.success);
    assert_eq!(first.message, "Successfully joined the game!");
    let map = first.map.unwrap();
    assert_eq!(map.map, vec!["   ", " A ", "   "]);
    assert_eq!(map.color_map[0].identifier, "A");

    let second: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;
    assert!(!second.success);
    assert_eq!(second.message, "Player ID already exists!");
    assert!(second.map.is_none());
}

#[tokio::test]
async fn empty_player_id_is_a_bad_request() {
    let (router, _) = app();
    let (status, bytes) = post(&router, "/rpc/join", json!({"player_id": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("player_id"));
}

#[tokio::test]
async fn update_and_shoot_show_up_in_the_snapshot() {
    let (router, state) = app();
    let _: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;

    let snapshot: UpdateResponse = call(
        &router,
        "/rpc/update",
        json!({"client_id": "A", "position": {"x": 100.0, "y": 100.0}, "direction": 0.0}),
    )
    .await;
    assert_eq!(snapshot.states.len(), 1);
    assert_eq!(snapshot.states[0].hp, 100);
    assert!(snapshot.bullets.is_empty());

    let shot: ShootResponse = call(&router, "/rpc/shoot", json!({"player_id": "A"})).await;
    assert!(shot.success);

    state.world.tick(0.1);

    let snapshot: UpdateResponse = call(
        &router,
        "/rpc/update",
        json!({"client_id": "A", "position": {"x": 100.0, "y": 100.0}, "direction": 0.0}),
    )
    .await;
    assert_eq!(snapshot.bullets.len(), 1);
    let bullet = &snapshot.bullets[0];
    assert_eq!(bullet.owner_id, "A");
    assert!((bullet.position.x - 150.0).abs() < 1e-3);
    assert!((bullet.position.y - 100.0).abs() < 1e-3);
}

#[tokio::test]
async fn unknown_players_cannot_shoot_or_leave() {
    let (router, _) = app();

    let shot: ShootResponse = call(&router, "/rpc/shoot", json!({"player_id": "ghost"})).await;
    assert!(!shot.success);

    let left: LeaveResponse = call(&router, "/rpc/leave", json!({"player_id": "ghost"})).await;
    assert!(!left.success);
    assert_eq!(left.message, "Player ID does not exist!");
}

#[tokio::test]
async fn leave_frees_the_id() {
    let (router, state) = app();
    let _: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;

    let left: LeaveResponse = call(&router, "/rpc/leave", json!({"player_id": "A"})).await;
    assert!(left.success);
    assert_eq!(left.message, "Successfully left the game!");
    assert_eq!(state.world.stats().players, 0);

    let again: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;
    assert!(again.success);
}

#[tokio::test]
async fn full_server_rejects_joins() {
    let (router, _) = app_with(Config {
        max_players: 1,
        ..Config::default()
    });
    let _: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;

    let rejected: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "B"})).await;
    assert!(!rejected.success);
    assert_eq!(rejected.message, "Server is full!");
}

#[tokio::test]
async fn updates_are_rate_limited_per_player() {
    let (router, _) = app_with(Config {
        update_rate_limit: 1,
        ..Config::default()
    });
    let body = json!({"client_id": "A", "position": {"x": 0.0, "y": 0.0}, "direction": 0.0});

    let (status, _) = post(&router, "/rpc/update", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&router, "/rpc/update", body).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Another player has its own budget
    let (status, _) = post(
        &router,
        "/rpc/update",
        json!({"client_id": "B", "position": {"x": 0.0, "y": 0.0}, "direction": 0.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rpc_calls_wait_for_a_free_slot() {
    let (router, _) = app_with(Config {
        max_concurrent_requests: 1,
        ..Config::default()
    });

    // First call holds the only slot while its body is still streaming
    let (mut body_tx, body_rx) = futures::channel::mpsc::channel::<Result<Bytes, std::io::Error>>(1);
    let slow = Request::builder()
        .method("POST")
        .uri("/rpc/join")
        .header("content-type", "application/json")
        .body(Body::from_stream(body_rx))
        .unwrap();
    let first = tokio::spawn(router.clone().oneshot(slow));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let router2 = router.clone();
    let second = tokio::spawn(async move {
        post(&router2, "/rpc/join", json!({"player_id": "B"})).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!second.is_finished());

    // Health is outside the RPC pool
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let health = router.clone().oneshot(request).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    body_tx
        .send(Ok(Bytes::from(json!({"player_id": "A"}).to_string())))
        .await
        .unwrap();
    drop(body_tx);

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let bytes = to_bytes(first.into_body(), usize::MAX).await.unwrap();
    let joined: JoinResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(joined.success);

    let (status, bytes) = tokio::time::timeout(Duration::from_secs(5), second)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    let joined: JoinResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(joined.success);
}

#[test]
fn health_reports_world_counters() {
    tokio_test::block_on(async {
        let (router, state) = app();
        let _: JoinResponse = call(&router, "/rpc/join", json!({"player_id": "A"})).await;
        state.world.tick(0.016);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["players"], 1);
        assert_eq!(health["max_players"], 32);
        assert_eq!(health["tick"], 1);

        state.request_shutdown();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health["status"], "shutting_down");
    });
}
