use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use crate::core::observer::ObserverRegistry;
use crate::core::state::{ConnectionState, FailureReason};
use crate::core::supervisor::SupervisorConfig;
use crate::permission::{GrantOutcome, PermissionGate};
use crate::profiles::{Credential, Profile, ProfileId};
use crate::tunnel::{ActiveTunnel, TunnelEngine, TunnelEvent};

pub(crate) enum SessionCommand {
    Disconnect,
}

/// One profile's connection state plus the fan-out to its observers.
///
/// Written only by the owning session task; the supervisor reads it for
/// `current_state`. Publishing happens under the same lock as the mutation,
/// so subscribers see transitions exactly in the order they occurred.
pub(crate) struct StateCell {
    profile_id: ProfileId,
    registry: Arc<ObserverRegistry>,
    state: Mutex<ConnectionState>,
}

impl StateCell {
    pub(crate) fn new(profile_id: ProfileId, registry: Arc<ObserverRegistry>) -> Self {
        Self {
            profile_id,
            registry,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        self.state.lock().unwrap().clone()
    }

    fn set(&self, next: ConnectionState) {
        let mut guard = self.state.lock().unwrap();
        if *guard == next {
            return;
        }
        debug!(
            "{}: {} -> {}",
            self.profile_id,
            guard.status_text(),
            next.status_text()
        );
        *guard = next.clone();
        self.registry.publish(&self.profile_id, &next);
    }
}

/// Everything a session task needs to drive one profile.
pub(crate) struct SessionContext {
    pub(crate) profile: Profile,
    pub(crate) credential: Credential,
    pub(crate) engine: Arc<dyn TunnelEngine>,
    pub(crate) gate: Arc<PermissionGate>,
    pub(crate) cell: Arc<StateCell>,
    pub(crate) commands: mpsc::Receiver<SessionCommand>,
    pub(crate) config: SupervisorConfig,
}

enum PermVerdict {
    Granted,
    Denied,
    Failed(String),
    Cancelled,
}

enum Drive {
    /// The session wound down cleanly; final state is already published.
    Finished,
    /// The tunnel was lost; worth another attempt.
    Lost(String),
}

/// Drive one profile from `Connecting` to wherever its story ends.
///
/// Permission acquisition, tunnel establishment and the live event loop are
/// all multiplexed against the command channel, so a disconnect request
/// cancels whatever is in flight instead of racing it.
pub(crate) async fn run(mut ctx: SessionContext) {
    info!("session for profile {} starting", ctx.profile.id());
    ctx.cell.set(ConnectionState::Connecting);

    let mut failed_attempts: u32 = 0;
    loop {
        let failure: String;

        match await_permission(&mut ctx).await {
            PermVerdict::Granted => {
                match open_tunnel(&mut ctx).await {
                    Opened::Tunnel(tunnel) => {
                        match drive_tunnel(&mut ctx, tunnel, &mut failed_attempts).await {
                            Drive::Finished => return,
                            Drive::Lost(reason) => failure = reason,
                        }
                    }
                    Opened::Failed(reason) => failure = reason,
                    Opened::Cancelled => {
                        wind_down_cancelled(&ctx);
                        return;
                    }
                }
            }
            PermVerdict::Denied => {
                info!("profile {}: permission denied", ctx.profile.id());
                ctx.cell
                    .set(ConnectionState::Error(FailureReason::PermissionDenied));
                return;
            }
            PermVerdict::Failed(reason) => failure = reason,
            PermVerdict::Cancelled => {
                wind_down_cancelled(&ctx);
                return;
            }
        }

        failed_attempts += 1;
        warn!(
            "profile {}: attempt {}/{} failed: {}",
            ctx.profile.id(),
            failed_attempts,
            ctx.config.retry.max_attempts,
            failure
        );
        if failed_attempts >= ctx.config.retry.max_attempts {
            ctx.cell
                .set(ConnectionState::Error(FailureReason::TunnelFailure(
                    format!("{} (gave up after {} attempts)", failure, failed_attempts),
                )));
            return;
        }
        if !backoff(&mut ctx, failed_attempts).await {
            return;
        }
    }
}

/// Disconnect arrived while nothing was open yet.
fn wind_down_cancelled(ctx: &SessionContext) {
    info!(
        "profile {}: connect cancelled before the tunnel came up",
        ctx.profile.id()
    );
    ctx.cell.set(ConnectionState::Disconnecting);
    ctx.cell.set(ConnectionState::Disconnected);
}

async fn await_permission(ctx: &mut SessionContext) -> PermVerdict {
    let pending = ctx.gate.request();
    tokio::select! {
        _ = ctx.commands.recv() => PermVerdict::Cancelled,
        outcome = timeout(ctx.config.permission_timeout, pending.wait()) => match outcome {
            Ok(Ok(GrantOutcome::Granted)) => PermVerdict::Granted,
            Ok(Ok(GrantOutcome::Denied)) => PermVerdict::Denied,
            Ok(Err(e)) => PermVerdict::Failed(format!("permission request failed: {}", e)),
            Err(_) => PermVerdict::Failed("permission request timed out".into()),
        },
    }
}

enum Opened {
    Tunnel(ActiveTunnel),
    Failed(String),
    Cancelled,
}

async fn open_tunnel(ctx: &mut SessionContext) -> Opened {
    tokio::select! {
        // A dropped open future means the attempt is abandoned, not leaked:
        // no handle existed yet, so there is nothing to tear down.
        _ = ctx.commands.recv() => Opened::Cancelled,
        result = timeout(
            ctx.config.open_timeout,
            ctx.engine.open(&ctx.profile, &ctx.credential),
        ) => match result {
            Ok(Ok(tunnel)) => Opened::Tunnel(tunnel),
            Ok(Err(e)) => Opened::Failed(format!("tunnel open failed: {}", e)),
            Err(_) => Opened::Failed("tunnel open timed out".into()),
        },
    }
}

/// Pump tunnel events until the tunnel is lost or a disconnect lands.
async fn drive_tunnel(
    ctx: &mut SessionContext,
    tunnel: ActiveTunnel,
    failed_attempts: &mut u32,
) -> Drive {
    let ActiveTunnel { handle, mut events } = tunnel;
    loop {
        tokio::select! {
            _ = ctx.commands.recv() => {
                ctx.cell.set(ConnectionState::Disconnecting);
                if let Err(e) = ctx.engine.close(handle).await {
                    warn!("profile {}: close of {} failed: {}", ctx.profile.id(), handle, e);
                }
                drain_until_closed(&mut events, ctx.config.close_grace).await;
                ctx.cell.set(ConnectionState::Disconnected);
                info!("profile {}: disconnected", ctx.profile.id());
                return Drive::Finished;
            }
            event = events.recv() => match event {
                Some(TunnelEvent::Establishing) => {
                    debug!("profile {}: {} establishing", ctx.profile.id(), handle);
                }
                Some(TunnelEvent::Live) => {
                    *failed_attempts = 0;
                    ctx.cell.set(ConnectionState::Connected);
                }
                Some(TunnelEvent::Degraded) => {
                    mark_reconnecting(ctx);
                    let _ = ctx.engine.close(handle).await;
                    return Drive::Lost("tunnel degraded".into());
                }
                Some(TunnelEvent::Closed(reason)) => {
                    mark_reconnecting(ctx);
                    return Drive::Lost(format!("tunnel closed: {}", reason));
                }
                None => {
                    mark_reconnecting(ctx);
                    return Drive::Lost("tunnel event feed ended".into());
                }
            },
        }
    }
}

/// An established connection that drops out goes to `Reconnecting`; losses
/// before the first `Live` keep the state the caller is already seeing.
fn mark_reconnecting(ctx: &SessionContext) {
    if ctx.cell.get().is_connected() {
        ctx.cell.set(ConnectionState::Reconnecting);
    }
}

async fn drain_until_closed(events: &mut mpsc::Receiver<TunnelEvent>, grace: Duration) {
    let drained = timeout(grace, async {
        while let Some(event) = events.recv().await {
            if matches!(event, TunnelEvent::Closed(_)) {
                break;
            }
        }
    })
    .await;
    if drained.is_err() {
        debug!("no close acknowledgement within {:?}", grace);
    }
}

/// Wait out the backoff delay. Returns `false` when a disconnect arrived
/// during the wait, in which case the session has already wound down.
async fn backoff(ctx: &mut SessionContext, failed_attempts: u32) -> bool {
    let delay = ctx.config.retry.delay_for(failed_attempts);
    debug!(
        "profile {}: backing off {:?} before attempt {}",
        ctx.profile.id(),
        delay,
        failed_attempts + 1
    );
    tokio::select! {
        _ = ctx.commands.recv() => {
            wind_down_cancelled(ctx);
            false
        }
        _ = sleep(delay) => true,
    }
}
