use vpnlink_core::{ConnectionState, FailureReason};

mod common;
use common::fake_engine::OpenBehavior;
use common::{fast_config, next_state, rig_with};

// An engine that degrades on every attempt must exhaust the budget and stop;
// no silent infinite retry, and not a single attempt more than configured.
#[tokio::test]
async fn degrading_engine_exhausts_the_budget_with_exact_attempt_count() {
    let config = fast_config();
    let budget = config.retry.max_attempts as usize;
    let rig = rig_with(OpenBehavior::Degrade, config);
    let mut subscription = rig.supervisor.subscribe(&rig.profile_id);

    rig.supervisor
        .connect(&rig.profile_id)
        .await
        .expect("connect should be accepted");

    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);

    // The tunnel never reaches Live, so the state stays Connecting until the
    // budget runs out.
    let terminal = next_state(&mut subscription).await;
    assert!(
        matches!(
            terminal,
            ConnectionState::Error(FailureReason::TunnelFailure(_))
        ),
        "expected a tunnel failure, got {:?}",
        terminal
    );

    assert_eq!(rig.engine.open_count(), budget);
    assert!(rig
        .supervisor
        .current_state(&rig.profile_id)
        .await
        .is_error());
}

// Outright refusals walk the same retry path as degradations.
#[tokio::test]
async fn refusing_engine_exhausts_the_budget() {
    let config = fast_config();
    let budget = config.retry.max_attempts as usize;
    let rig = rig_with(OpenBehavior::Refuse, config);
    let mut subscription = rig.supervisor.subscribe(&rig.profile_id);

    rig.supervisor.connect(&rig.profile_id).await.unwrap();
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);
    assert!(next_state(&mut subscription).await.is_error());
    assert_eq!(rig.engine.open_count(), budget);
}

// An open attempt that never resolves is bounded by the open timeout and
// charged against the same budget.
#[tokio::test]
async fn hanging_opens_time_out_and_consume_the_budget() {
    let mut config = fast_config();
    config.open_timeout = std::time::Duration::from_millis(50);
    let budget = config.retry.max_attempts as usize;
    let rig = rig_with(OpenBehavior::Hang, config);
    let mut subscription = rig.supervisor.subscribe(&rig.profile_id);

    rig.supervisor.connect(&rig.profile_id).await.unwrap();
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);

    let terminal = next_state(&mut subscription).await;
    assert!(
        matches!(
            terminal,
            ConnectionState::Error(FailureReason::TunnelFailure(_))
        ),
        "expected a tunnel failure, got {:?}",
        terminal
    );
    assert_eq!(rig.engine.open_count(), budget);
}

// Re-entering after a terminal failure clears the error.
#[tokio::test]
async fn connect_after_budget_exhaustion_starts_fresh() {
    let rig = rig_with(OpenBehavior::Degrade, fast_config());
    let mut subscription = rig.supervisor.subscribe(&rig.profile_id);

    rig.supervisor.connect(&rig.profile_id).await.unwrap();
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);
    assert!(next_state(&mut subscription).await.is_error());

    rig.engine.set_behavior(OpenBehavior::Live);
    rig.supervisor
        .connect(&rig.profile_id)
        .await
        .expect("connect after a terminal error should be accepted");
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connected);
}
