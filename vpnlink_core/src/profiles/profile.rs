use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a [`Profile`].
///
/// Freshly minted ids are v4 UUIDs, so an id is never handed out twice even
/// after the profile it named has been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(Uuid);

impl ProfileId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque authentication parameters carried by a profile.
///
/// The supervisor never looks inside; the bytes are handed verbatim to the
/// tunnel engine.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthBlob(Vec<u8>);

impl AuthBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AuthBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthBlob({} bytes)", self.0.len())
    }
}

/// A named VPN server configuration.
///
/// Profiles are immutable once created; to change one, delete it and create
/// a replacement. Fields are therefore only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    id: ProfileId,
    name: String,
    server: String,
    auth: AuthBlob,
}

impl Profile {
    pub fn new(name: impl Into<String>, server: impl Into<String>, auth: AuthBlob) -> Self {
        Self {
            id: ProfileId::fresh(),
            name: name.into(),
            server: server.into(),
            auth,
        }
    }

    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn auth(&self) -> &AuthBlob {
        &self.auth
    }
}

/// Username plus secret for one profile.
///
/// Kept apart from [`Profile`] so profiles can be listed or exported without
/// dragging secrets along. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    username: String,
    secret: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
