use keyring::Entry;
use log::debug;

use vpnlink_core::profiles::{Credential, CredentialError, CredentialStore, ProfileId};

const SERVICE_NAME: &str = "vpnlink";

/// Credential storage on the OS keychain (Windows Credential Manager, macOS
/// Keychain, Linux Secret Service).
///
/// One keychain entry per profile id, holding the JSON-encoded
/// username/secret pair.
#[derive(Debug, Default)]
pub struct KeyringSecrets;

impl KeyringSecrets {
    pub fn new() -> Self {
        Self
    }

    fn entry_for(id: &ProfileId) -> Result<Entry, CredentialError> {
        Entry::new(SERVICE_NAME, &id.to_string())
            .map_err(|e| CredentialError::Backend(e.to_string()))
    }
}

impl CredentialStore for KeyringSecrets {
    fn set(&self, id: &ProfileId, credential: Credential) -> Result<(), CredentialError> {
        let payload = serde_json::to_string(&credential)
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        Self::entry_for(id)?
            .set_password(&payload)
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        debug!("credential stored for profile {}", id);
        Ok(())
    }

    fn get(&self, id: &ProfileId) -> Result<Option<Credential>, CredentialError> {
        match Self::entry_for(id)?.get_password() {
            Ok(payload) => {
                let credential: Credential = serde_json::from_str(&payload)
                    .map_err(|e| CredentialError::Backend(e.to_string()))?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }

    fn clear(&self, id: &ProfileId) -> Result<(), CredentialError> {
        match Self::entry_for(id)?.delete_credential() {
            Ok(()) => {
                debug!("credential cleared for profile {}", id);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Backend(e.to_string())),
        }
    }
}
