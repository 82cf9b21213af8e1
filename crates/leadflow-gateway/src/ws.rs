// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket subscriber endpoint bridging the broadcast hub.
//!
//! A client opens `GET /ws/{channel}` with the channel id it passed in its
//! conversation request; every event published on that channel arrives as
//! one JSON text frame:
//!
//! ```json
//! {"event": "turn_chunk", "data": {"chunk": "Hi", "done": false}}
//! {"event": "turn_chunk", "data": {"chunk": "", "done": true, "qualificationStatus": "STRONG"}}
//! {"event": "turn_stream_error", "data": {"message": "...", "detail": "..."}}
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::server::GatewayState;

/// WebSocket upgrade handler for `GET /ws/{channel}`.
pub async fn ws_handler(
    Path(channel): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, channel, state))
}

/// Forward hub events to one subscriber until either side disconnects.
async fn handle_socket(socket: WebSocket, channel: String, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut rx = state.hub.subscribe(&channel);
    debug!(channel, "websocket subscriber connected");

    // Forward hub events to the socket.
    let forward_channel = channel.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "failed to serialize event frame");
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Slow consumer; keep going from the oldest buffered event.
                    warn!(
                        channel = %forward_channel,
                        skipped,
                        "websocket subscriber lagged"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Drain the client side; subscribers only listen, so nothing but close
    // matters here.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    forward_task.abort();
    debug!(channel, "websocket subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_broadcast::PublishedEvent;

    #[test]
    fn event_frame_shape() {
        let event = PublishedEvent {
            event: "turn_chunk".into(),
            data: serde_json::json!({"chunk": "Hi", "done": false}),
        };
        let frame = serde_json::to_value(&event).unwrap();
        assert_eq!(frame["event"], "turn_chunk");
        assert_eq!(frame["data"]["chunk"], "Hi");
        assert_eq!(frame["data"]["done"], false);
    }
}
