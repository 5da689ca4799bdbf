//! Headless bot client.
//!
//! Joins the server, wanders in a circle and fires at random intervals.
//! Useful for load testing and for watching collisions without a renderer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_game_server::client::{run_network_loop, ClientSession, RpcClient};
use arena_game_server::game::geometry::Vec2;
use arena_game_server::util::time::{tick_interval, DEFAULT_TICK_RATE};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:12345";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let server_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let name = std::env::var("BOT_NAME")
        .unwrap_or_else(|_| format!("bot-{:04}", rand::thread_rng().gen_range(0..10_000)));

    info!(server = %server_url, bot = %name, "Starting bot");

    let rpc = RpcClient::new(&server_url)?;
    let session = Arc::new(Mutex::new(ClientSession::new(name)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut network = tokio::spawn(run_network_loop(
        rpc,
        session.clone(),
        DEFAULT_TICK_RATE,
        shutdown_rx,
    ));

    let frame = tick_interval(DEFAULT_TICK_RATE);
    let mut ticker = tokio::time::interval(frame);
    let mut heading: f32 = 0.0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, leaving");
                break;
            }
            result = &mut network => {
                // Network loop ended on its own: join rejected or connection lost
                result??;
                return Ok(());
            }
        }

        let mut rng = rand::thread_rng();
        heading += frame.as_secs_f32() * rng.gen_range(0.5..2.0);

        let mut s = session.lock();
        if s.local.is_dead() {
            continue;
        }

        let axis = Vec2::from_angle(heading);
        s.move_local(axis, frame.as_secs_f32());
        let target = s.local.position + Vec2::from_angle(heading + rng.gen_range(-1.0..1.0));
        s.local.aim_at(target);

        if rng.gen_bool(0.05) {
            s.request_shot();
        }
    }

    shutdown_tx.send_replace(true);
    match tokio::time::timeout(Duration::from_secs(5), network).await {
        Ok(result) => result??,
        Err(_) => warn!("Network loop did not stop in time"),
    }

    info!("Bot stopped");
    Ok(())
}
