use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::profiles::profile::{AuthBlob, Profile, ProfileId};

/// In-memory registry of VPN profiles, keyed by [`ProfileId`].
///
/// The store itself has no persistence; a collaborator such as
/// `vpnlink_storage::ProfileVault` can [`adopt`](Self::adopt) stored profiles
/// back into it at startup.
#[derive(Debug, Default)]
pub struct ProfileStore {
    inner: Mutex<HashMap<ProfileId, Profile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profile with a fresh identifier and return a copy of it.
    pub fn create(&self, name: &str, server: &str, auth: AuthBlob) -> Profile {
        let profile = Profile::new(name, server, auth);
        debug!("profile {} created for {}", profile.id(), profile.server());
        let mut map = self.inner.lock().unwrap();
        map.insert(profile.id().clone(), profile.clone());
        profile
    }

    /// Insert an already-identified profile, e.g. one loaded from disk.
    /// Replaces any previous profile with the same id wholesale.
    pub fn adopt(&self, profile: Profile) {
        let mut map = self.inner.lock().unwrap();
        map.insert(profile.id().clone(), profile);
    }

    pub fn get(&self, id: &ProfileId) -> Option<Profile> {
        let map = self.inner.lock().unwrap();
        map.get(id).cloned()
    }

    pub fn list(&self) -> Vec<Profile> {
        let map = self.inner.lock().unwrap();
        map.values().cloned().collect()
    }

    /// Delete a profile (`true` if removed, `false` if it didn't exist).
    pub fn delete(&self, id: &ProfileId) -> bool {
        let mut map = self.inner.lock().unwrap();
        map.remove(id).is_some()
    }
}
