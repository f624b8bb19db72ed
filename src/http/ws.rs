use super::state::AppState;
use crate::error::{SessionError, SessionResult};
use crate::session::{Inbound, ServerMessage, Transport};
use crate::timing::TimingBus;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Session transport over the sending half of a WebSocket
pub struct WsTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    open: AtomicBool,
}

impl WsTransport {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
            open: AtomicBool::new(true),
        }
    }

    /// Record that the receiving side saw the client go away
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub async fn close(&self) {
        self.mark_closed();
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!("WebSocket close failed: {}", e);
        }
    }

    async fn send(&self, message: Message) -> SessionResult<()> {
        if !self.is_open() {
            return Err(SessionError::TransportClosed);
        }

        let mut sink = self.sink.lock().await;
        sink.send(message).await.map_err(|e| {
            self.mark_closed();
            SessionError::Transport(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn send_text(&self, text: String) -> SessionResult<()> {
        self.send(Message::Text(text)).await
    }

    async fn send_binary(&self, data: Vec<u8>) -> SessionResult<()> {
        self.send(Message::Binary(data)).await
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// GET /ws/translate
/// Real-time translation session
pub async fn translate_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_translate(socket, state))
}

async fn run_translate(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let transport = Arc::new(WsTransport::new(sink));

    let session = match state.sessions.create_session(transport.clone()).await {
        Ok(session) => session,
        Err(e) => {
            error!("Rejecting translation client: {}", e);
            let reply = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Err(e) = transport.send_text(reply.to_json()).await {
                debug!("Dropped rejection message: {}", e);
            }
            transport.close().await;
            return;
        }
    };

    info!("Translation client connected (session {})", session.id());
    session.announce().await;

    while let Some(frame) = stream.next().await {
        let inbound = match frame {
            Ok(Message::Text(text)) => Inbound::Text(text),
            Ok(Message::Binary(bytes)) => Inbound::Binary(bytes),
            Ok(Message::Close(_)) => Inbound::Disconnect,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        };

        if !session.handle_inbound(inbound).await {
            break;
        }
    }

    info!("Translation client disconnected (session {})", session.id());
    transport.mark_closed();
    state.sessions.remove_session(&session).await;
}

/// GET /ws/metrics
/// Live stream of timing events, one JSON text frame per event
pub async fn metrics_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let timing = Arc::clone(&state.timing);
    ws.on_upgrade(move |socket| run_metrics(socket, timing))
}

async fn run_metrics(socket: WebSocket, timing: Arc<TimingBus>) {
    let (mut sink, mut stream) = socket.split();
    let mut subscription = timing.subscribe();
    let id = subscription.id();

    info!("Metrics client connected ({:?})", id);

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize timing event: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                match frame {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    timing.unsubscribe(id);
    info!("Metrics client disconnected ({:?})", id);
}
