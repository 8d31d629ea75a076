pub mod fake_engine;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use vpnlink_core::permission::{PermissionGate, StaticBroker};
use vpnlink_core::profiles::{
    AuthBlob, Credential, CredentialStore, MemoryCredentialStore, ProfileId, ProfileStore,
};
use vpnlink_core::{
    ConnectionState, ConnectionSupervisor, RetryPolicy, Subscription, SupervisorConfig,
};

use self::fake_engine::{FakeTunnelEngine, OpenBehavior};

/// A supervisor wired to in-memory collaborators, with one profile ("lab")
/// ready to connect.
pub struct Rig {
    pub supervisor: ConnectionSupervisor,
    pub engine: Arc<FakeTunnelEngine>,
    pub broker: Arc<StaticBroker>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub profile_id: ProfileId,
}

/// Timeouts and retries shrunk so failure paths finish within a test run.
pub fn fast_config() -> SupervisorConfig {
    SupervisorConfig {
        permission_timeout: Duration::from_secs(2),
        open_timeout: Duration::from_secs(2),
        close_grace: Duration::from_millis(200),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
        },
    }
}

pub fn rig(behavior: OpenBehavior) -> Rig {
    rig_with(behavior, fast_config())
}

pub fn rig_with(behavior: OpenBehavior, config: SupervisorConfig) -> Rig {
    let profiles = Arc::new(ProfileStore::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let broker = Arc::new(StaticBroker::granting());
    let gate = Arc::new(PermissionGate::new(broker.clone()));
    let engine = Arc::new(FakeTunnelEngine::new(behavior));

    let profile = profiles.create("lab", "vpn.lab.example.org", AuthBlob::default());
    credentials
        .set(profile.id(), Credential::new("ectest", "Abcd1234"))
        .expect("in-memory credential set cannot fail");
    let profile_id = profile.id().clone();

    let supervisor = ConnectionSupervisor::with_config(
        profiles,
        credentials.clone(),
        gate,
        engine.clone(),
        config,
    );

    Rig {
        supervisor,
        engine,
        broker,
        credentials,
        profile_id,
    }
}

/// Next state change, with a timeout converting hangs into readable
/// test failures.
pub async fn next_state(subscription: &mut Subscription) -> ConnectionState {
    timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("timed out waiting for a state change")
        .expect("subscription channel closed unexpectedly")
        .state
}

/// Poll `condition` until it holds (or fail the test after two seconds).
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within 2s");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
