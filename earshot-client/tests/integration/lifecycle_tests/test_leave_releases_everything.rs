use earshot_client::{DisconnectReason, MeshError, MeshEvent};
use earshot_core::ClientMessage;

use crate::integration::init_tracing;
use crate::utils::{MockBehavior, TestHub, join_hub, join_scripted, ordered_ids, test_config};

#[tokio::test]
async fn test_leave_releases_everything() {
    init_tracing();

    let hub = TestHub::new();
    let ids = ordered_ids(3);
    let (mut alice, alice_sink) = join_hub(&hub, ids[0], "alice").await;
    let (mut bob, _) = join_hub(&hub, ids[1], "bob").await;
    let (carol, _) = join_hub(&hub, ids[2], "carol").await;

    assert!(alice.wait_for_connected(&bob.id()).await);
    assert!(alice.wait_for_connected(&carol.id()).await);
    assert_eq!(alice.capture.active(), 1);

    alice.handle.leave().await.expect("Leave failed");

    // Everything is torn down by the time leave returns
    assert_eq!(alice.capture.active(), 0);
    assert_eq!(alice.audio.attached_count(), 0);
    assert_eq!(alice.transport.sessions_open(&bob.id()), 0);
    assert_eq!(alice.transport.sessions_open(&carol.id()), 0);
    assert_eq!(alice_sink.sent().last(), Some(&ClientMessage::LeaveVoice));
    assert!(
        alice
            .wait_for_event(|e| *e == MeshEvent::Left)
            .await
            .is_some()
    );
    assert!(matches!(
        alice.handle.snapshot().await,
        Err(MeshError::SignalingClosed)
    ));

    assert_eq!(
        bob.wait_for_event(|e| matches!(e, MeshEvent::PeerDisconnected { .. }))
            .await,
        Some(MeshEvent::PeerDisconnected {
            peer_id: ids[0],
            reason: DisconnectReason::RemoteLeft,
        })
    );
    assert!(carol.wait_for_absent(&alice.id()).await);
    assert!(bob.wait_for_connected(&carol.id()).await);
}

#[tokio::test]
async fn test_signaling_loss_releases_capture() {
    init_tracing();

    let ids = ordered_ids(2);
    let (local, peer) = (ids[0], ids[1]);
    let (mut client, mut coordinator) =
        join_scripted(local, MockBehavior::Stalls, test_config()).await;

    coordinator.nearby(1, &[peer]);
    coordinator.expect_offer(peer).await;

    drop(coordinator);

    assert!(
        client
            .wait_for_event(|e| *e == MeshEvent::Left)
            .await
            .is_some()
    );
    assert_eq!(client.capture.active(), 0);
    assert_eq!(client.transport.sessions_open(&peer), 0);
}

#[tokio::test]
async fn test_disconnected_peer_is_dropped() {
    init_tracing();

    let hub = TestHub::new();
    let ids = ordered_ids(2);
    let (alice, _) = join_hub(&hub, ids[0], "alice").await;
    let (bob, _) = join_hub(&hub, ids[1], "bob").await;
    assert!(alice.wait_for_connected(&bob.id()).await);

    hub.disconnect(bob.id()).await;
    assert!(alice.wait_for_absent(&bob.id()).await);
    assert!(!alice.audio.is_attached(&bob.id()));
}
