use std::fmt::{self, Display};

/// Why a connection attempt ended in [`ConnectionState::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The platform authorization was refused; the user must re-grant.
    PermissionDenied,
    /// The tunnel could not be established or kept alive.
    TunnelFailure(String),
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::PermissionDenied => write!(f, "permission denied"),
            FailureReason::TunnelFailure(msg) => write!(f, "tunnel failure: {}", msg),
        }
    }
}

/// Connection lifecycle state of one profile.
///
/// Exactly one value exists per active profile, owned by its supervisor
/// session; observers only ever see it through state-change notifications or
/// `current_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Disconnecting,
    Error(FailureReason),
}

impl ConnectionState {
    /// A live state holds (or is about to hold) a tunnel; a second connect
    /// request must be refused while in one.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ConnectionState::Error(_))
    }

    /// Short human-readable label for UI collaborators.
    pub fn status_text(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting...",
            ConnectionState::Disconnecting => "Disconnecting...",
            ConnectionState::Error(_) => "Error",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}
