use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Mutex;

use crate::profiles::profile::{Credential, ProfileId};

/// A central error enum for credential-store errors.
#[derive(Debug)]
pub enum CredentialError {
    Backend(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Backend(msg) => write!(f, "Credential backend error: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Where credentials live.
///
/// The supervisor only reads through this trait; callers set or clear
/// credentials independently of the profile they belong to. Implementations
/// decide the persistence technology (in-memory here, the OS keychain in
/// `vpnlink_storage`).
pub trait CredentialStore: Send + Sync {
    fn set(&self, id: &ProfileId, credential: Credential) -> Result<(), CredentialError>;
    fn get(&self, id: &ProfileId) -> Result<Option<Credential>, CredentialError>;
    fn clear(&self, id: &ProfileId) -> Result<(), CredentialError>;
}

/// Process-local credential store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<HashMap<ProfileId, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, id: &ProfileId, credential: Credential) -> Result<(), CredentialError> {
        let mut map = self.inner.lock().unwrap();
        map.insert(id.clone(), credential);
        Ok(())
    }

    fn get(&self, id: &ProfileId) -> Result<Option<Credential>, CredentialError> {
        let map = self.inner.lock().unwrap();
        Ok(map.get(id).cloned())
    }

    fn clear(&self, id: &ProfileId) -> Result<(), CredentialError> {
        let mut map = self.inner.lock().unwrap();
        map.remove(id);
        Ok(())
    }
}
