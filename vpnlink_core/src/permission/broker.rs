use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// Result of one authorization round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    Denied,
}

/// A central error enum for permission errors.
#[derive(Debug)]
pub enum PermissionError {
    Broker(String),
    /// The gate abandoned the request before an answer arrived.
    Interrupted,
}

impl Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::Broker(msg) => write!(f, "Permission broker error: {}", msg),
            PermissionError::Interrupted => write!(f, "Permission request interrupted"),
        }
    }
}

impl std::error::Error for PermissionError {}

/// The platform side of permission acquisition: whatever shows the user a
/// consent prompt (an Android grant activity, polkit, a fixed policy, ...).
///
/// Called at most once per authorization round; the gate coalesces
/// concurrent requests onto a single call.
#[async_trait]
pub trait PermissionBroker: Send + Sync {
    async fn authorize(&self) -> Result<GrantOutcome, PermissionError>;
}

/// Broker with a fixed, flippable verdict. Useful for headless embeddings
/// and tests.
#[derive(Debug)]
pub struct StaticBroker {
    granting: AtomicBool,
}

impl StaticBroker {
    pub fn granting() -> Self {
        Self {
            granting: AtomicBool::new(true),
        }
    }

    pub fn denying() -> Self {
        Self {
            granting: AtomicBool::new(false),
        }
    }

    pub fn set_granting(&self, granting: bool) {
        self.granting.store(granting, Ordering::SeqCst);
    }
}

#[async_trait]
impl PermissionBroker for StaticBroker {
    async fn authorize(&self) -> Result<GrantOutcome, PermissionError> {
        if self.granting.load(Ordering::SeqCst) {
            Ok(GrantOutcome::Granted)
        } else {
            Ok(GrantOutcome::Denied)
        }
    }
}
