use std::fmt::{self, Display};

use crate::profiles::ProfileId;

/// A central error enum for supervisor call errors.
///
/// Only conditions the caller can observe synchronously appear here;
/// asynchronous outcomes (a denied grant, an exhausted retry budget) are
/// published as [`ConnectionState::Error`](crate::core::state::ConnectionState)
/// transitions on the subscription channel instead.
#[derive(Debug)]
pub enum SupervisorError {
    /// No profile with this id exists in the store.
    ProfileNotFound(ProfileId),
    /// A connection attempt for this profile is already in flight.
    AlreadyConnecting(ProfileId),
    /// Nothing to disconnect for this profile.
    NotConnected(ProfileId),
    /// The connection attempt could not even start.
    TunnelFailure(String),
}

impl Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorError::ProfileNotFound(id) => write!(f, "No profile with id '{}'", id),
            SupervisorError::AlreadyConnecting(id) => {
                write!(f, "A connection for profile '{}' is already in flight", id)
            }
            SupervisorError::NotConnected(id) => {
                write!(f, "No connection for profile '{}'", id)
            }
            SupervisorError::TunnelFailure(msg) => write!(f, "Tunnel failure: {}", msg),
        }
    }
}

impl std::error::Error for SupervisorError {}
