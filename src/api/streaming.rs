use crate::api::handler::AppState;
use crate::batch::BatchEvent;
use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// GET /batch/events - live progress of running batches
pub async fn stream_batch_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let events = state.service.executor().subscribe();
    ws.on_upgrade(move |socket| handle_event_stream(socket, events))
}

async fn handle_event_stream(socket: WebSocket, mut events: broadcast::Receiver<BatchEvent>) {
    let (mut sender, mut receiver) = socket.split();

    // Only watch for the client going away
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut recv_task => break,
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Event stream lagged, {} events dropped", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let Ok(json) = serde_json::to_string(&event) else {
                    continue;
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    recv_task.abort();
    debug!("Batch event stream closed");
}
