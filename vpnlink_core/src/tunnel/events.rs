/// State changes an engine reports for one tunnel handle.
///
/// The supervisor folds these into the per-profile connection state; engines
/// emit them on the feed returned from `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelEvent {
    /// Handshake in progress; the tunnel is not yet carrying traffic.
    Establishing,
    /// The tunnel is up and passing packets.
    Live,
    /// The tunnel lost its link but the engine considers it recoverable.
    Degraded,
    /// The tunnel is gone, with the engine's reason.
    Closed(String),
}
