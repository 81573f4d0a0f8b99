use earshot_server::ServerConfig;

use crate::integration::init_tracing;
use crate::utils::{TestWsClient, spawn_test_server};

#[tokio::test]
async fn test_welcome_and_ice_config() {
    init_tracing();

    let config = ServerConfig {
        ice_servers: vec!["stun:stun.example.org:3478".to_string()],
        ..ServerConfig::default()
    };
    let server = spawn_test_server(config).await;

    let alice = TestWsClient::connect(&server.ws_url())
        .await
        .expect("Failed to connect alice");
    let bob = TestWsClient::connect(&server.ws_url())
        .await
        .expect("Failed to connect bob");

    // Every connection gets its own id
    assert_ne!(alice.id, bob.id);

    assert_eq!(alice.ice_servers.len(), 1);
    assert_eq!(
        alice.ice_servers[0].urls,
        vec!["stun:stun.example.org:3478".to_string()]
    );
    assert_eq!(server.service.connection_count(), 2);

    alice.close().await.expect("Failed to close");
    bob.close().await.expect("Failed to close");
}
