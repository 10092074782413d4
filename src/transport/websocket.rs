//! WebSocket transport
//!
//! Accepts WebSocket connections and answers every JSON text frame with one
//! JSON reply. Each connection runs on its own task; frames of one connection
//! are handled in order.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::app::App;
use crate::transport::handler::handle_text;
use crate::transport::message::ServerMessage;

pub async fn start_websocket_server(addr: &str, app: Arc<App>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("WebSocket server listening on ws://{}", listener.local_addr()?);
    serve(listener, app).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, app: Arc<App>) {
    while let Ok((stream, peer)) = listener.accept().await {
        let app = app.clone();
        let connection_id = format!("conn-{}", uuid::Uuid::new_v4());
        debug!(%peer, %connection_id, "Accepted connection");
        tokio::spawn(handle_connection(stream, app, connection_id));
    }
}

async fn handle_connection(stream: TcpStream, app: Arc<App>, connection_id: String) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%connection_id, error = %e, "WebSocket handshake error");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    while let Some(frame) = ws_receiver.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                warn!(%connection_id, error = %e, "WebSocket read error");
                break;
            }
        };

        let reply = match msg {
            WsMessage::Text(text) => handle_text(&app, text.as_str()).await,
            WsMessage::Close(_) => break,
            WsMessage::Binary(_) => ServerMessage::BadRequest {
                message: "binary frames are not supported".to_string(),
            },
            _ => continue,
        };

        let body = match serde_json::to_string(&reply) {
            Ok(body) => body,
            Err(e) => {
                error!(%connection_id, error = %e, "Failed to encode reply");
                continue;
            }
        };
        if let Err(e) = ws_sender.send(WsMessage::Text(body.into())).await {
            warn!(%connection_id, error = %e, "Failed to send reply");
            break;
        }
    }

    info!(%connection_id, "Connection closed");
}
