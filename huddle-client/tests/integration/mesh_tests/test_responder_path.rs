use huddle_client::NegotiationState;
use huddle_core::PeerId;

use crate::integration::{create_test_mesh, init_tracing};

#[tokio::test]
async fn remote_offer_creates_link_and_answers() {
    init_tracing();
    let mesh = create_test_mesh();
    let remote = PeerId::new();

    mesh.offer_from(&remote, "remote-offer").await;

    let snapshot = mesh.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].state, NegotiationState::Negotiated);
    assert_eq!(mesh.signaling.answers_to(&remote), 1);

    let log = mesh.transports.log_for(&remote).expect("transport exists");
    assert_eq!(log.lock().unwrap().offers_applied, vec!["remote-offer"]);
}

#[tokio::test]
async fn unroutable_answer_and_candidate_are_dropped() {
    init_tracing();
    let mesh = create_test_mesh();
    let unknown = PeerId::new();

    mesh.answer_from(&unknown, "orphan-answer").await;
    mesh.candidate_from(&unknown, "orphan-candidate").await;

    assert!(mesh.snapshot().await.is_empty());
    assert_eq!(mesh.transports.created(), 0);
}

#[tokio::test]
async fn rejected_offer_drops_only_that_link() {
    init_tracing();
    let mesh = create_test_mesh();
    let good = PeerId::new();
    let bad = PeerId::new();

    mesh.offer_from(&good, "good-offer").await;
    mesh.snapshot().await;

    mesh.transports.fail_descriptions();
    mesh.offer_from(&bad, "malformed-offer").await;

    let snapshot = mesh.snapshot().await;
    assert_eq!(snapshot.len(), 1, "only the rejected link is dropped");
    assert_eq!(snapshot[0].peer_id, good);
    assert_eq!(mesh.signaling.answers_to(&bad), 0);

    let bad_log = mesh.transports.log_for(&bad).expect("transport was created");
    assert!(bad_log.lock().unwrap().closed, "rejected transport is closed");
}

#[tokio::test]
async fn rejected_answer_closes_the_link() {
    init_tracing();
    let mesh = create_test_mesh();
    let remote = PeerId::new();

    mesh.announce(&remote).await;
    mesh.snapshot().await;

    mesh.transports.fail_descriptions();
    mesh.answer_from(&remote, "malformed-answer").await;

    assert!(mesh.snapshot().await.is_empty());
    let log = mesh.transports.log_for(&remote).expect("transport exists");
    assert!(log.lock().unwrap().closed);
}
