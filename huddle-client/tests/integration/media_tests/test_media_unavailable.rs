use huddle_client::{MeshCommand, MeshConfig, NegotiationState, NullCapture, SessionError};
use huddle_core::PeerId;
use std::sync::Arc;

use crate::integration::{create_test_mesh_with, init_tracing};

#[tokio::test]
async fn capture_failure_mid_offer_still_negotiates() {
    init_tracing();
    let mesh = create_test_mesh_with(MeshConfig::default(), Arc::new(NullCapture));
    let remote = PeerId::new();

    // Offer already in flight when acquisition fails.
    mesh.announce(&remote).await;
    mesh.cmd_tx
        .send(MeshCommand::MediaFailed(SessionError::MediaUnavailable(
            "permission denied".to_owned(),
        )))
        .await
        .expect("coordinator loop gone");

    mesh.answer_from(&remote, "remote-answer").await;

    assert_eq!(mesh.state_of(&remote).await, Some(NegotiationState::Negotiated));
    let log = mesh.transports.log_for(&remote).expect("transport exists");
    assert_eq!(log.lock().unwrap().tracks, 0, "receive-only: no local tracks");
}

#[tokio::test]
async fn responder_negotiates_without_media_too() {
    init_tracing();
    let mesh = create_test_mesh_with(MeshConfig::default(), Arc::new(NullCapture));
    let remote = PeerId::new();

    mesh.cmd_tx
        .send(MeshCommand::MediaFailed(SessionError::MediaUnavailable(
            "no device".to_owned(),
        )))
        .await
        .expect("coordinator loop gone");
    mesh.offer_from(&remote, "remote-offer").await;

    assert_eq!(mesh.state_of(&remote).await, Some(NegotiationState::Negotiated));
    assert_eq!(mesh.signaling.answers_to(&remote), 1);
}
