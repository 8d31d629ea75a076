use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tokio::sync::oneshot;

use crate::permission::broker::{GrantOutcome, PermissionBroker, PermissionError};

/// Where the process currently stands with the platform authorization.
///
/// `Granted` sticks for the rest of the process lifetime; platform grants are
/// not persisted, so a restarted process begins at `Unrequested` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    Unrequested,
    Pending,
    Granted,
    Denied,
}

struct GateInner {
    state: GrantState,
    waiters: Vec<oneshot::Sender<GrantOutcome>>,
}

/// Mediates the one-time platform authorization required before any tunnel
/// may be created.
///
/// All outstanding [`request`](PermissionGate::request)s resolve from the
/// same broker round: while a round is pending, further requests attach to
/// it instead of prompting again. A denial is not fatal; the next request
/// starts a fresh round.
pub struct PermissionGate {
    broker: Arc<dyn PermissionBroker>,
    inner: Arc<Mutex<GateInner>>,
}

impl PermissionGate {
    pub fn new(broker: Arc<dyn PermissionBroker>) -> Self {
        Self {
            broker,
            inner: Arc::new(Mutex::new(GateInner {
                state: GrantState::Unrequested,
                waiters: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> GrantState {
        self.inner.lock().unwrap().state
    }

    /// Ask for the grant. Returns a token that resolves once the platform
    /// answers; resolves immediately if the grant is already held.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&self) -> PendingGrant {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            GrantState::Granted => PendingGrant(PendingInner::Ready(GrantOutcome::Granted)),
            GrantState::Pending => {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                PendingGrant(PendingInner::Waiting(rx))
            }
            GrantState::Unrequested | GrantState::Denied => {
                inner.state = GrantState::Pending;
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);

                let broker = Arc::clone(&self.broker);
                let shared = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    let outcome = match broker.authorize().await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!("permission broker failed, treating as denial: {}", e);
                            GrantOutcome::Denied
                        }
                    };
                    debug!("permission round resolved: {:?}", outcome);
                    let mut inner = shared.lock().unwrap();
                    inner.state = match outcome {
                        GrantOutcome::Granted => GrantState::Granted,
                        GrantOutcome::Denied => GrantState::Denied,
                    };
                    for waiter in inner.waiters.drain(..) {
                        let _ = waiter.send(outcome);
                    }
                });

                PendingGrant(PendingInner::Waiting(rx))
            }
        }
    }
}

enum PendingInner {
    Ready(GrantOutcome),
    Waiting(oneshot::Receiver<GrantOutcome>),
}

/// Token for one in-flight permission request.
pub struct PendingGrant(PendingInner);

impl PendingGrant {
    pub async fn wait(self) -> Result<GrantOutcome, PermissionError> {
        match self.0 {
            PendingInner::Ready(outcome) => Ok(outcome),
            PendingInner::Waiting(rx) => rx.await.map_err(|_| PermissionError::Interrupted),
        }
    }
}
