use vpnlink_core::permission::GrantState;
use vpnlink_core::{ConnectionState, FailureReason};

mod common;
use common::fake_engine::OpenBehavior;
use common::{next_state, rig};

// The scenario a first-run user hits: deny the platform prompt, watch the
// error arrive on the same channel as every other transition, grant, retry.
#[tokio::test]
async fn denied_grant_is_observable_and_a_retry_succeeds() {
    vpnlink_core::utils::logging::init_logging();

    let rig = rig(OpenBehavior::Live);
    rig.broker.set_granting(false);

    let mut subscription = rig.supervisor.subscribe(&rig.profile_id);

    rig.supervisor
        .connect(&rig.profile_id)
        .await
        .expect("connect should be accepted");
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);
    assert_eq!(
        next_state(&mut subscription).await,
        ConnectionState::Error(FailureReason::PermissionDenied)
    );

    // Denied is not fatal: no tunnel was opened, and the user may re-grant.
    assert_eq!(rig.engine.open_count(), 0);
    assert_eq!(rig.supervisor.permission_state(), GrantState::Denied);

    rig.broker.set_granting(true);
    rig.supervisor
        .connect(&rig.profile_id)
        .await
        .expect("retry after a denial should be accepted");
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connecting);
    assert_eq!(next_state(&mut subscription).await, ConnectionState::Connected);
    assert_eq!(rig.engine.open_count(), 1);
    assert_eq!(rig.supervisor.permission_state(), GrantState::Granted);
}
