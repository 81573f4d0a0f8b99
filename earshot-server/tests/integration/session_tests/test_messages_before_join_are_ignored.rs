use earshot_core::ClientMessage;
use earshot_server::ServerConfig;

use crate::integration::init_tracing;
use crate::utils::{TestWsClient, spawn_test_server};

#[tokio::test]
async fn test_messages_before_join_are_ignored() {
    init_tracing();

    let server = spawn_test_server(ServerConfig::default()).await;
    let mut alice = TestWsClient::connect(&server.ws_url()).await.unwrap();
    let mut lurker = TestWsClient::connect(&server.ws_url()).await.unwrap();

    alice.join("alice").await.unwrap();
    alice.expect_nearby(&[]).await.unwrap();

    // Not joined: neither moves nor relays go anywhere
    lurker.move_to(1.0, 1.0).await.unwrap();
    lurker
        .send(ClientMessage::VoiceOffer {
            to: alice.id,
            offer: "v=0".to_string(),
            attempt: 1,
        })
        .await
        .unwrap();

    alice.expect_silence(300).await.expect("Alice heard a lurker");
    lurker.expect_silence(100).await.unwrap();
}
