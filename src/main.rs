//! Arena Game Server - entry point
//!
//! Loads the map, starts the tick loop and the operator console, then serves
//! the session RPCs until `exit`, Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_game_server::app::AppState;
use arena_game_server::config::Config;
use arena_game_server::console::{run_console, spawn_stdin_reader};
use arena_game_server::game::WorldMap;
use arena_game_server::http::build_router;
use arena_game_server::util::rate_limit::PRUNE_INTERVAL;
use arena_game_server::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Arena Game Server");
    info!("Server address: {}", config.server_addr);

    let map = WorldMap::load_or_builtin(config.map_path.as_deref());

    // Create application state
    let state = AppState::new(config.clone(), map);

    // Spawn the authoritative tick loop
    let tick_loop = tokio::spawn(
        state
            .world
            .clone()
            .run(config.tick_rate, state.shutdown_signal()),
    );

    // Reclaim limiter entries for ids that went quiet
    tokio::spawn(
        state
            .rate_limiter
            .clone()
            .run_pruner(PRUNE_INTERVAL, state.shutdown_signal()),
    );

    // Spawn the operator console
    tokio::spawn(run_console(state.clone(), spawn_stdin_reader()));

    // Build router
    let router = build_router(state.clone());

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state.shutdown_signal()))
        .await?;

    // Stop the tick loop as well when the signal came from the OS
    state.request_shutdown();
    tick_loop.await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal(mut console_exit: watch::Receiver<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let console = async {
        let closed = console_exit.wait_for(|exit| *exit).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
        _ = console => {
            info!("Console requested exit, starting graceful shutdown");
        }
    }
}
