//! Operator console on the server's stdin
//!
//! Commands:
//! - `exit` - graceful shutdown
//! - `kick <player_id>` - remove a player without notifying it
//! - `reloadmap` - reload the map file from `MAP_PATH`
//! - `list` - log every joined player
//! - `help` - log the command list

use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::AppState;

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Exit,
    Kick(String),
    ReloadMap,
    List,
    Help,
}

/// Console parse and execution errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("No map file configured (set MAP_PATH)")]
    NoMapPath,
}

/// What the console loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let command = match command.to_lowercase().as_str() {
        "exit" => ConsoleCommand::Exit,
        "kick" => match args.as_slice() {
            [player_id] => ConsoleCommand::Kick(player_id.to_string()),
            _ => return Err(ConsoleError::Usage("kick <player_id>")),
        },
        "reloadmap" => ConsoleCommand::ReloadMap,
        "list" => ConsoleCommand::List,
        "help" => ConsoleCommand::Help,
        other => return Err(ConsoleError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

/// Run a command against the live server
pub fn execute(command: ConsoleCommand, state: &AppState) -> Flow {
    match command {
        ConsoleCommand::Exit => {
            info!("Stopping server...");
            state.request_shutdown();
            return Flow::Exit;
        }
        ConsoleCommand::Kick(player_id) => {
            match state.world.kick(&player_id) {
                Ok(()) => state.rate_limiter.prune(),
                Err(e) => error!(player_id = %player_id, error = %e, "Kick failed"),
            }
        }
        ConsoleCommand::ReloadMap => match state.config.map_path.as_deref() {
            Some(path) => {
                if let Err(e) = state.world.reload_map(path) {
                    error!(path = %path.display(), error = %e, "Map reload rejected");
                }
            }
            None => error!("{}", ConsoleError::NoMapPath),
        },
        ConsoleCommand::List => {
            let players = state.world.players();
            info!(count = players.len(), "Players");
            for p in players {
                info!(
                    player_id = %p.client_id,
                    x = p.position.x,
                    y = p.position.y,
                    hp = p.hp,
                    "  player"
                );
            }
        }
        ConsoleCommand::Help => {
            info!("Commands: exit, kick <player_id>, reloadmap, list, help");
        }
    }

    Flow::Continue
}

/// Read stdin lines on a dedicated thread.
///
/// Blocking stdin reads would otherwise hold up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to read console input");
                    break;
                }
            }
        }
    });
    rx
}

/// Process console lines until `exit` or the input closes
pub async fn run_console(state: AppState, mut lines: mpsc::UnboundedReceiver<String>) {
    info!("Console ready (type `help` for commands)");

    while let Some(line) = lines.recv().await {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };

        if execute(command, &state) == Flow::Exit {
            break;
        }
    }
}
