//! `WebSocket` handler for real-time frame streaming.
//!
//! Clients connect to `GET /ws/frames`, immediately receive the current
//! frame, then receive every newly published frame as a JSON text message.
//! Frames come from a `watch` channel, so a slow client skips straight to
//! the newest frame instead of queueing stale ones.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use strata_render::Frame;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming frames.
///
/// # Route
///
/// `GET /ws/frames`
pub async fn ws_frames(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: send the current frame, then forward
/// each new frame as a text message.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("Frame stream client connected");

    let mut frames = state.subscribe_frames();
    let first = Arc::clone(&*frames.borrow_and_update());
    if send_frame(&mut socket, &first).await.is_err() {
        debug!("Frame stream client disconnected (send failed)");
        return;
    }

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    debug!("Frame channel closed, shutting down WebSocket");
                    return;
                }
                let frame = Arc::clone(&*frames.borrow_and_update());
                if send_frame(&mut socket, &frame).await.is_err() {
                    debug!("Frame stream client disconnected (send failed)");
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Frame stream client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("Frame stream client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients have nothing to say on this stream.
                    }
                }
            }
        }
    }
}

/// Serialize and send one frame. `Err` means the client is gone.
async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize frame: {e}");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}
