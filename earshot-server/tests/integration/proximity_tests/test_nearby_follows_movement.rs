use earshot_server::ServerConfig;

use crate::integration::init_tracing;
use crate::utils::{TestWsClient, spawn_test_server};

#[tokio::test]
async fn test_nearby_follows_movement() {
    init_tracing();

    let server = spawn_test_server(ServerConfig::default()).await;
    let mut alice = TestWsClient::connect(&server.ws_url()).await.unwrap();
    let mut bob = TestWsClient::connect(&server.ws_url()).await.unwrap();

    alice.join("alice").await.unwrap();
    let first = alice.expect_nearby(&[]).await.unwrap();
    bob.join("bob").await.unwrap();
    bob.expect_nearby(&[alice.id]).await.unwrap();
    let second = alice.expect_nearby(&[bob.id]).await.unwrap();
    assert!(second > first);

    // 2.0 away is within the default 3.0
    bob.move_to(2.0, 0.0).await.unwrap();
    bob.expect_nearby(&[alice.id]).await.unwrap();

    bob.move_to(10.0, 0.0).await.unwrap();
    bob.expect_nearby(&[]).await.unwrap();
    let third = alice.expect_nearby(&[]).await.unwrap();
    assert!(third > second);

    // Exactly on the threshold counts as nearby
    bob.move_to(0.0, 3.0).await.unwrap();
    bob.expect_nearby(&[alice.id]).await.unwrap();
    alice.expect_nearby(&[bob.id]).await.unwrap();
}

#[tokio::test]
async fn test_custom_max_distance() {
    init_tracing();

    let config = ServerConfig {
        max_distance: 10.0,
        ..ServerConfig::default()
    };
    let server = spawn_test_server(config).await;
    let mut alice = TestWsClient::connect(&server.ws_url()).await.unwrap();
    let mut bob = TestWsClient::connect(&server.ws_url()).await.unwrap();

    alice.join("alice").await.unwrap();
    bob.join("bob").await.unwrap();
    bob.expect_nearby(&[alice.id]).await.unwrap();

    bob.move_to(8.0, 0.0).await.unwrap();
    bob.expect_nearby(&[alice.id]).await.unwrap();
    alice.expect_nearby(&[bob.id]).await.unwrap();
}
