use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use giant_chase_server::config::SessionConfig;
use giant_chase_server::constants::CLIENT_QUEUE_CAPACITY;
use giant_chase_server::room::{OutboundMessage, RoomCommand};
use giant_chase_server::room_manager::{join_room, RoomManager};
use giant_chase_server::server_protocol::{error_message, parse_client_message, ParsedClientMessage};
use giant_chase_server::server_utils::{make_id, sanitize_name};
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type SharedState = Arc<Mutex<RoomManager>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative server for the giant chase game")]
struct Cli {
    /// Falls back to $PORT, then 2567.
    #[arg(long)]
    port: Option<u16>,
    /// JSON file with session settings (boardSize, lobbyWaitingTime, ...).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Falls back to $STATIC_DIR.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let port = cli
        .port
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
        })
        .unwrap_or(2567);

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    info!(?config, "session config");
    let state: SharedState = Arc::new(Mutex::new(RoomManager::new(config)?));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(cli.static_dir) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.to_string_lossy(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        app
    };
    let app = app.layer(CorsLayer::permissive());

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(port, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn resolve_static_dir(cli_dir: Option<PathBuf>) -> Option<PathBuf> {
    cli_dir
        .or_else(|| std::env::var("STATIC_DIR").ok().map(PathBuf::from))
        .filter(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let player_id = make_id("player");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(CLIENT_QUEUE_CAPACITY);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    let mut room: Option<mpsc::Sender<RoomCommand>> = None;
    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => continue,
            },
            Message::Close(_) => break,
            _ => continue,
        };
        let Some(parsed) = parse_client_message(&raw) else {
            debug!(player_id = %player_id, "dropping malformed message");
            continue;
        };

        match parsed {
            ParsedClientMessage::Join { name, character_id } => {
                if room.is_some() {
                    continue;
                }
                let joined =
                    join_room(&state, &player_id, sanitize_name(&name), character_id, tx.clone())
                        .await;
                match joined {
                    Ok(joined) => {
                        info!(player_id = %player_id, room = %joined.room_id, "connection joined room");
                        room = Some(joined.commands);
                    }
                    Err(err) => {
                        warn!(player_id = %player_id, error = %err, "join rejected");
                        let _ = tx.try_send(OutboundMessage::Text(
                            error_message(&err.to_string()).to_string(),
                        ));
                        let _ = tx.try_send(OutboundMessage::Close {
                            code: 4000,
                            reason: "join rejected".to_string(),
                        });
                        break;
                    }
                }
            }
            ParsedClientMessage::Move { direction } => {
                let Some(commands) = room.as_ref() else {
                    continue;
                };
                let command = RoomCommand::Move {
                    player_id: player_id.clone(),
                    direction,
                };
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            ParsedClientMessage::Leave => {
                if room.is_some() {
                    break;
                }
            }
        }
    }

    if let Some(commands) = room {
        let _ = commands
            .send(RoomCommand::Leave {
                player_id: player_id.clone(),
            })
            .await;
    }
    drop(tx);
    let _ = writer.await;
    debug!(player_id = %player_id, "connection closed");
}
