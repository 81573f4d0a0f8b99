use earshot_core::ServerMessage;
use earshot_server::ServerConfig;

use crate::integration::init_tracing;
use crate::utils::{TestWsClient, spawn_test_server};

#[tokio::test]
async fn test_disconnect_broadcasts_peer_left() {
    init_tracing();

    let server = spawn_test_server(ServerConfig::default()).await;
    let mut alice = TestWsClient::connect(&server.ws_url()).await.unwrap();
    let mut bob = TestWsClient::connect(&server.ws_url()).await.unwrap();

    alice.join("alice").await.unwrap();
    alice.expect_nearby(&[]).await.unwrap();
    bob.join("bob").await.unwrap();
    alice.expect_nearby(&[bob.id]).await.unwrap();
    bob.expect_nearby(&[alice.id]).await.unwrap();

    // Dropping the socket counts as leaving
    let bob_id = bob.id;
    bob.close().await.unwrap();

    let msg = alice
        .recv_until(|m| matches!(m, ServerMessage::PeerLeft { .. }))
        .await
        .expect("No peer-left");
    assert_eq!(msg, ServerMessage::PeerLeft { id: bob_id });

    alice.expect_nearby(&[]).await.expect("Bob still nearby");
}

#[tokio::test]
async fn test_explicit_leave_keeps_socket_open() {
    init_tracing();

    let server = spawn_test_server(ServerConfig::default()).await;
    let mut alice = TestWsClient::connect(&server.ws_url()).await.unwrap();
    let mut bob = TestWsClient::connect(&server.ws_url()).await.unwrap();

    alice.join("alice").await.unwrap();
    bob.join("bob").await.unwrap();
    alice.expect_nearby(&[bob.id]).await.unwrap();

    bob.send(earshot_core::ClientMessage::LeaveVoice).await.unwrap();
    let msg = alice
        .recv_until(|m| matches!(m, ServerMessage::PeerLeft { .. }))
        .await
        .unwrap();
    assert_eq!(msg, ServerMessage::PeerLeft { id: bob.id });

    // Bob can come back on the same connection
    bob.join("bob").await.unwrap();
    alice.expect_nearby(&[bob.id]).await.unwrap();
    assert_eq!(server.service.connection_count(), 2);
}
