//! A deterministic **in-process stand-in** for any type that implements
//! `vpnlink_core::tunnel::TunnelEngine`.
//!
//! *  **From the test's perspective**
//!    * Choose how `open` behaves up front (or flip it mid-test with
//!      `set_behavior`).
//!    * Drive a live tunnel's feed by hand via `latest_feed()`.
//!    * Assert on `open_count()` / `close_count()` afterwards.
//!
//! *  **Why this exists**: It lets integration tests exercise the *real*
//!    supervision machinery (tasks, channels, retry, cancellation) without a
//!    VPN gateway anywhere near the test run.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use vpnlink_core::profiles::{Credential, Profile};
use vpnlink_core::tunnel::{ActiveTunnel, TunnelEngine, TunnelError, TunnelEvent, TunnelHandle};

/// How the fake behaves when the supervisor asks it to open a tunnel.
#[derive(Debug, Clone, Copy)]
pub enum OpenBehavior {
    /// Open succeeds and the feed immediately reports Establishing + Live.
    Live,
    /// Open succeeds but the feed immediately reports Degraded.
    Degrade,
    /// Open never completes (exercises cancellation).
    Hang,
    /// Open fails outright.
    Refuse,
    /// Open succeeds and emits nothing; the test drives the feed itself.
    Manual,
}

pub struct FakeTunnelEngine {
    behavior: Mutex<OpenBehavior>,
    next_handle: AtomicU64,
    opens: AtomicUsize,
    closes: AtomicUsize,
    feeds: Mutex<BTreeMap<u64, mpsc::Sender<TunnelEvent>>>,
}

impl FakeTunnelEngine {
    pub fn new(behavior: OpenBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            next_handle: AtomicU64::new(0),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            feeds: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn set_behavior(&self, behavior: OpenBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Number of `open` calls the supervisor made so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of `close` calls the supervisor made so far.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Sender feeding events into the most recently opened tunnel.
    pub fn latest_feed(&self) -> Option<mpsc::Sender<TunnelEvent>> {
        let feeds = self.feeds.lock().unwrap();
        feeds.iter().next_back().map(|(_, tx)| tx.clone())
    }
}

#[async_trait]
impl TunnelEngine for FakeTunnelEngine {
    async fn open(
        &self,
        _profile: &Profile,
        _credential: &Credential,
    ) -> Result<ActiveTunnel, TunnelError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();

        match behavior {
            OpenBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
            OpenBehavior::Refuse => Err(TunnelError::Refused("fake engine refuses".into())),
            OpenBehavior::Live | OpenBehavior::Degrade | OpenBehavior::Manual => {
                let raw = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
                let (tx, rx) = mpsc::channel(32);

                match behavior {
                    OpenBehavior::Live => {
                        let _ = tx.try_send(TunnelEvent::Establishing);
                        let _ = tx.try_send(TunnelEvent::Live);
                    }
                    OpenBehavior::Degrade => {
                        let _ = tx.try_send(TunnelEvent::Establishing);
                        let _ = tx.try_send(TunnelEvent::Degraded);
                    }
                    _ => {}
                }

                self.feeds.lock().unwrap().insert(raw, tx);
                Ok(ActiveTunnel {
                    handle: TunnelHandle::new(raw),
                    events: rx,
                })
            }
        }
    }

    async fn close(&self, handle: TunnelHandle) -> Result<(), TunnelError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        // Acknowledge on the feed the way a real engine would.
        if let Some(tx) = self.feeds.lock().unwrap().remove(&handle.raw()) {
            let _ = tx.try_send(TunnelEvent::Closed("close requested".into()));
        }
        Ok(())
    }
}
