use huddle_client::{MeshConfig, StaticCapture};
use huddle_core::PeerId;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{create_test_mesh_with, init_tracing};

#[tokio::test(start_paused = true)]
async fn stalled_offer_is_dropped_like_a_leave() {
    init_tracing();
    let config = MeshConfig {
        negotiation_timeout: Some(Duration::from_millis(100)),
    };
    let mesh = create_test_mesh_with(config, Arc::new(StaticCapture::new(Vec::new())));
    let remote = PeerId::new();

    mesh.announce(&remote).await;
    assert_eq!(mesh.snapshot().await.len(), 1);

    // Past the timeout and the next sweep, the pending link is gone.
    tokio::time::sleep(Duration::from_secs(6)).await;
    mesh.wait_until(|snapshot| snapshot.is_empty()).await;

    let log = mesh.transports.log_for(&remote).expect("transport exists");
    assert!(log.lock().unwrap().closed);
}

#[tokio::test(start_paused = true)]
async fn negotiated_links_never_expire() {
    init_tracing();
    let config = MeshConfig {
        negotiation_timeout: Some(Duration::from_millis(100)),
    };
    let mesh = create_test_mesh_with(config, Arc::new(StaticCapture::new(Vec::new())));
    let remote = PeerId::new();

    mesh.announce(&remote).await;
    mesh.answer_from(&remote, "remote-answer").await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(mesh.snapshot().await.len(), 1, "negotiated link survives the sweep");
}
