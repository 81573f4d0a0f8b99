use earshot_core::{IceServerConfig, ParticipantId, ServerMessage};
use earshot_server::{
    Coordinator, CoordinatorCommand, LoggingReportSink, SignalingService, signaling_router,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const SERVER_STUN: &str = "stun:stun.earshot.test:3478";

/// Starts the real coordinator behind its WebSocket endpoint on an ephemeral
/// port. Returns the `ws://` url.
pub async fn spawn_coordinator_server() -> String {
    let (cmd_tx, cmd_rx) = mpsc::channel::<CoordinatorCommand>(256);
    let service = SignalingService::new(
        cmd_tx,
        vec![IceServerConfig {
            urls: vec![SERVER_STUN.to_string()],
            username: None,
            credential: None,
        }],
    );
    let coordinator = Coordinator::new(
        cmd_rx,
        Arc::new(service.clone()),
        Arc::new(LoggingReportSink::new()),
    );
    tokio::spawn(coordinator.run());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    let app = signaling_router(service);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    ws_url(addr)
}

/// Accepts one connection, sends a welcome and closes the socket.
pub async fn spawn_closing_server(participant_id: ParticipantId) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("No connection");
        let mut ws = accept_async(stream).await.expect("Handshake failed");

        let welcome = serde_json::to_string(&ServerMessage::Welcome { participant_id })
            .expect("Failed to encode welcome");
        ws.send(Message::Text(welcome.into()))
            .await
            .expect("Failed to send welcome");
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    ws_url(addr)
}

fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{}/ws", addr)
}
