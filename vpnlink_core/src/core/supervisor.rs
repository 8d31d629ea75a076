use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{mpsc, Mutex};

use crate::core::errors::SupervisorError;
use crate::core::observer::{ObserverRegistry, Subscription};
use crate::core::retry::RetryPolicy;
use crate::core::session::{self, SessionCommand, SessionContext, StateCell};
use crate::core::state::ConnectionState;
use crate::permission::{GrantState, PermissionGate};
use crate::profiles::{CredentialStore, ProfileId, ProfileStore};
use crate::tunnel::TunnelEngine;

/// Tunables for connection supervision.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Bound on waiting for the platform grant.
    pub permission_timeout: Duration,
    /// Bound on one tunnel-open attempt.
    pub open_timeout: Duration,
    /// How long to wait for the engine's close acknowledgement.
    pub close_grace: Duration,
    pub retry: RetryPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            permission_timeout: Duration::from_secs(30),
            open_timeout: Duration::from_secs(30),
            close_grace: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// The task driving one profile plus the channels to reach it.
///
/// Entries outlive their task on purpose: a finished session keeps the final
/// `Error`/`Disconnected` state readable until the next connect replaces it.
struct SessionHandle {
    task: tokio::task::JoinHandle<()>,
    commands: mpsc::Sender<SessionCommand>,
    cell: Arc<StateCell>,
}

impl SessionHandle {
    fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Orchestrates profiles, permission and the tunnel engine into one state
/// machine per active profile.
///
/// Cloning is cheap and shares the underlying state, so one supervisor can
/// serve any number of UI components concurrently. Each profile's lifecycle
/// is owned by a single spawned task; different profiles progress fully in
/// parallel.
#[derive(Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<Shared>,
}

struct Shared {
    profiles: Arc<ProfileStore>,
    credentials: Arc<dyn CredentialStore>,
    gate: Arc<PermissionGate>,
    engine: Arc<dyn TunnelEngine>,
    registry: Arc<ObserverRegistry>,
    sessions: Mutex<HashMap<ProfileId, SessionHandle>>,
    config: SupervisorConfig,
}

impl ConnectionSupervisor {
    pub fn new(
        profiles: Arc<ProfileStore>,
        credentials: Arc<dyn CredentialStore>,
        gate: Arc<PermissionGate>,
        engine: Arc<dyn TunnelEngine>,
    ) -> Self {
        Self::with_config(
            profiles,
            credentials,
            gate,
            engine,
            SupervisorConfig::default(),
        )
    }

    pub fn with_config(
        profiles: Arc<ProfileStore>,
        credentials: Arc<dyn CredentialStore>,
        gate: Arc<PermissionGate>,
        engine: Arc<dyn TunnelEngine>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                profiles,
                credentials,
                gate,
                engine,
                registry: Arc::new(ObserverRegistry::new()),
                sessions: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.inner.profiles
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    pub fn permission_state(&self) -> GrantState {
        self.inner.gate.state()
    }

    /// Start connecting the profile. Returns as soon as the attempt is
    /// accepted; progress arrives on the subscription channel.
    ///
    /// While a session for this profile is in flight, further calls return
    /// [`SupervisorError::AlreadyConnecting`] instead of opening a second
    /// tunnel. A profile whose last session ended in `Error` may connect
    /// again; doing so clears the error.
    pub async fn connect(&self, profile_id: &ProfileId) -> Result<(), SupervisorError> {
        let profile = self
            .inner
            .profiles
            .get(profile_id)
            .ok_or_else(|| SupervisorError::ProfileNotFound(profile_id.clone()))?;
        let credential = self
            .inner
            .credentials
            .get(profile_id)
            .map_err(|e| SupervisorError::TunnelFailure(format!("credential store: {}", e)))?
            .ok_or_else(|| {
                SupervisorError::TunnelFailure(format!(
                    "no credential set for profile '{}'",
                    profile_id
                ))
            })?;

        let mut sessions = self.inner.sessions.lock().await;
        if let Some(existing) = sessions.get(profile_id) {
            if existing.is_active() {
                debug!("connect refused, session for {} already active", profile_id);
                return Err(SupervisorError::AlreadyConnecting(profile_id.clone()));
            }
        }

        let (commands_tx, commands_rx) = mpsc::channel(8);
        let cell = Arc::new(StateCell::new(
            profile_id.clone(),
            Arc::clone(&self.inner.registry),
        ));
        let ctx = SessionContext {
            profile,
            credential,
            engine: Arc::clone(&self.inner.engine),
            gate: Arc::clone(&self.inner.gate),
            cell: Arc::clone(&cell),
            commands: commands_rx,
            config: self.inner.config.clone(),
        };
        let task = tokio::spawn(session::run(ctx));
        sessions.insert(
            profile_id.clone(),
            SessionHandle {
                task,
                commands: commands_tx,
                cell,
            },
        );
        info!("connect accepted for profile {}", profile_id);
        Ok(())
    }

    /// Ask the profile's session to wind down. Fire and forget: the session
    /// publishes `Disconnecting` and, once the tunnel is gone,
    /// `Disconnected`. Cancels an attempt that is still connecting.
    pub async fn disconnect(&self, profile_id: &ProfileId) -> Result<(), SupervisorError> {
        let sessions = self.inner.sessions.lock().await;
        let handle = sessions
            .get(profile_id)
            .ok_or_else(|| SupervisorError::NotConnected(profile_id.clone()))?;
        if !handle.is_active() {
            return Err(SupervisorError::NotConnected(profile_id.clone()));
        }
        handle
            .commands
            .send(SessionCommand::Disconnect)
            .await
            .map_err(|_| SupervisorError::NotConnected(profile_id.clone()))?;
        info!("disconnect requested for profile {}", profile_id);
        Ok(())
    }

    /// Current lifecycle state; `Disconnected` for profiles that never
    /// connected.
    pub async fn current_state(&self, profile_id: &ProfileId) -> ConnectionState {
        let sessions = self.inner.sessions.lock().await;
        sessions
            .get(profile_id)
            .map(|handle| handle.cell.get())
            .unwrap_or_default()
    }

    /// Subscribe to the profile's state-change feed. Works before the first
    /// connect; transitions are only ever delivered forward, never replayed.
    pub fn subscribe(&self, profile_id: &ProfileId) -> Subscription {
        self.inner.registry.subscribe(profile_id)
    }

    /// End a subscription. Nothing is delivered once this returns.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.inner.registry.unsubscribe(subscription);
    }
}
