use huddle_client::{MeshConfig, StaticCapture};
use huddle_core::PeerId;
use std::sync::Arc;

use crate::integration::{create_test_mesh_with, init_tracing};
use crate::utils::PendingCapture;

#[tokio::test]
async fn teardown_mid_negotiation_releases_everything() {
    init_tracing();
    let capture = Arc::new(StaticCapture::new(Vec::new()));
    let mesh = create_test_mesh_with(MeshConfig::default(), capture.clone());
    let r1 = PeerId::new();
    let r2 = PeerId::new();

    // One link still offer-pending, one fully negotiated.
    mesh.announce(&r1).await;
    mesh.offer_from(&r2, "remote-offer").await;
    mesh.snapshot().await;

    mesh.teardown().await;

    assert!(mesh.snapshot().await.is_empty(), "record set empty after teardown");
    assert!(capture.is_released(), "media source released");
    assert!(mesh.signaling.is_closed(), "signaling channel closed");
    assert!(mesh.signaling.left(), "leave announced before close");

    for peer in [&r1, &r2] {
        let log = mesh.transports.log_for(peer).expect("transport exists");
        assert!(log.lock().unwrap().closed, "transport closed for {peer}");
    }
}

#[tokio::test]
async fn teardown_while_media_acquisition_pending() {
    init_tracing();
    let capture = Arc::new(PendingCapture::new());
    let mesh = create_test_mesh_with(MeshConfig::default(), capture.clone());
    let remote = PeerId::new();

    mesh.announce(&remote).await;
    mesh.snapshot().await;

    // Acquisition never completed; teardown must still converge.
    mesh.teardown().await;

    assert!(mesh.snapshot().await.is_empty());
    assert!(capture.is_released());
    assert!(mesh.signaling.is_closed());
}

#[tokio::test]
async fn teardown_twice_is_safe() {
    init_tracing();
    let mesh = create_test_mesh_with(
        MeshConfig::default(),
        Arc::new(StaticCapture::new(Vec::new())),
    );

    mesh.teardown().await;
    // The loop has stopped; a second teardown cannot be delivered and the
    // session treats that as already-done.
    assert!(mesh.snapshot().await.is_empty());
}
