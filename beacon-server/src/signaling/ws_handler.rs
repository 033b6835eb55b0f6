use crate::AppState;
use crate::signaling::Connection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut conn = Connection::new(tx);

    // Writer task: drains frames queued by room coordinators. Dropping
    // its receiver is what rooms observe as delivery failure.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                Ok(signal) => state.router.dispatch(signal, &mut conn).await,
                Err(e) => warn!("invalid signaling frame, skipping: {e}"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Transport errors and closes are local to this connection; rooms
    // learn about it through the normal serialized path.
    conn.leave_all().await;
    send_task.abort();

    info!("signaling connection closed");
}
