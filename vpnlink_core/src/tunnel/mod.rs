//! Boundary to the component that owns the actual encrypted session.
//!
//! Everything protocol- or crypto-specific lives behind [`TunnelEngine`];
//! the supervisor only opens, observes and closes handles.

pub mod errors;
pub mod events;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::profiles::{Credential, Profile};

pub use errors::TunnelError;
pub use events::TunnelEvent;

/// Opaque token naming one open tunnel inside an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TunnelHandle(u64);

impl TunnelHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TunnelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tunnel#{}", self.0)
    }
}

/// A freshly opened tunnel: the handle to close it with, and the feed of
/// [`TunnelEvent`]s the engine will emit for it.
pub struct ActiveTunnel {
    pub handle: TunnelHandle,
    pub events: mpsc::Receiver<TunnelEvent>,
}

/// A trait representing a tunnel engine (OpenConnect, WireGuard, a fake in
/// tests, ...).
///
/// The supervisor is the exclusive owner of every handle it opens: no other
/// component may close it or race a second `open` for the same profile.
#[async_trait]
pub trait TunnelEngine: Send + Sync {
    /// Establish a tunnel for the profile. Resolves once the engine has a
    /// handle; readiness is reported asynchronously on the event feed.
    async fn open(
        &self,
        profile: &Profile,
        credential: &Credential,
    ) -> Result<ActiveTunnel, TunnelError>;

    /// Tear the tunnel down. The engine acknowledges on the feed with
    /// [`TunnelEvent::Closed`].
    async fn close(&self, handle: TunnelHandle) -> Result<(), TunnelError>;
}
