use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::core::state::ConnectionState;
use crate::profiles::ProfileId;

/// One state transition, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub profile_id: ProfileId,
    pub state: ConnectionState,
}

/// Handle binding one observer to a profile's state-change feed.
///
/// Delivery stops the moment the handle is passed to `unsubscribe` (or
/// dropped); each subscriber has its own queue, so a slow one never holds up
/// the supervisor or its peers.
pub struct Subscription {
    id: u64,
    profile_id: ProfileId,
    rx: mpsc::UnboundedReceiver<StateChange>,
}

impl Subscription {
    pub fn profile_id(&self) -> &ProfileId {
        &self.profile_id
    }

    /// Next transition, in publish order.
    pub async fn recv(&mut self) -> Option<StateChange> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<StateChange> {
        self.rx.try_recv().ok()
    }
}

struct Slot {
    id: u64,
    tx: mpsc::UnboundedSender<StateChange>,
}

/// Bookkeeping for state-change subscribers, per profile id.
pub(crate) struct ObserverRegistry {
    slots: Mutex<HashMap<ProfileId, Vec<Slot>>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn subscribe(&self, profile_id: &ProfileId) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slots = self.slots.lock().unwrap();
        slots
            .entry(profile_id.clone())
            .or_default()
            .push(Slot { id, tx });
        Subscription {
            id,
            profile_id: profile_id.clone(),
            rx,
        }
    }

    pub(crate) fn unsubscribe(&self, subscription: Subscription) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(list) = slots.get_mut(&subscription.profile_id) {
            list.retain(|slot| slot.id != subscription.id);
            if list.is_empty() {
                slots.remove(&subscription.profile_id);
            }
        }
        // The receiver is dropped here along with `subscription`, so nothing
        // can be delivered past this point.
    }

    /// Fan the transition out to every current subscriber of the profile.
    /// Senders whose receiver is gone are pruned on the way.
    pub(crate) fn publish(&self, profile_id: &ProfileId, state: &ConnectionState) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(list) = slots.get_mut(profile_id) {
            list.retain(|slot| {
                slot.tx
                    .send(StateChange {
                        profile_id: profile_id.clone(),
                        state: state.clone(),
                    })
                    .is_ok()
            });
            if list.is_empty() {
                slots.remove(profile_id);
            }
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self, profile_id: &ProfileId) -> usize {
        let slots = self.slots.lock().unwrap();
        slots.get(profile_id).map(|list| list.len()).unwrap_or(0)
    }
}
