use crate::coordinator::CoordinatorCommand;
use crate::signaling::SignalingService;
use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use earshot_core::{ClientMessage, ParticipantId, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Router exposing the signaling endpoint at `/ws`.
pub fn signaling_router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(service)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let participant_id = ParticipantId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, participant_id, service))
}

async fn handle_socket(
    socket: WebSocket,
    participant_id: ParticipantId,
    service: SignalingService,
) {
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_participant(participant_id, tx);
    service.send_signal(participant_id, &ServerMessage::Welcome { participant_id });
    service.send_signal(
        participant_id,
        &ServerMessage::IceConfig {
            ice_servers: service.get_ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(signal) => {
                            let Some(cmd) =
                                CoordinatorCommand::from_client(participant_id, signal)
                            else {
                                continue;
                            };
                            if let Err(e) = service.coordinator_tx.send(cmd).await {
                                error!("Coordinator died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {:?}", participant_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = service
                .coordinator_tx
                .send(CoordinatorCommand::Disconnect { participant_id })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_participant(&participant_id);
    info!("WebSocket disconnected: {}", participant_id);
}
