pub mod broker;
pub mod gate;

pub use broker::{GrantOutcome, PermissionBroker, PermissionError, StaticBroker};
pub use gate::{GrantState, PendingGrant, PermissionGate};
