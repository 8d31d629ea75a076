use std::{fs, io, path::PathBuf};

use directories::ProjectDirs;
use log::warn;
use serde_json::Error as SerdeError;

use vpnlink_core::profiles::{Profile, ProfileId, ProfileStore};

/// File-backed profile persistence: one JSON document per profile, named by
/// its id.
#[derive(Debug, Clone)]
pub struct ProfileVault {
    dir: PathBuf,
}

impl ProfileVault {
    /// `~/.config/vpnlink/profiles` on Linux, `%APPDATA%\vpnlink\profiles` on Windows, etc.
    pub fn open() -> io::Result<Self> {
        let proj = ProjectDirs::from("", "", "vpnlink")
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Unable to locate config dir"))?;
        Self::at(proj.config_dir().join("profiles"))
    }

    /// Vault rooted at an explicit directory (tests, portable installs).
    pub fn at(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_for(&self, id: &ProfileId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Returns every stored profile (silently skips malformed files).
    pub fn list(&self) -> io::Result<Vec<Profile>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::File::open(&path)
                .and_then(|f| serde_json::from_reader(f).map_err(SerdeError::into))
            {
                Ok(profile) => out.push(profile),
                Err(e) => warn!("could not read {:?}: {e}", path),
            }
        }
        Ok(out)
    }

    /// Create or overwrite a profile's file.
    pub fn save(&self, profile: &Profile) -> io::Result<()> {
        let file = fs::File::create(self.file_for(profile.id()))?;
        serde_json::to_writer_pretty(file, profile).map_err(SerdeError::into)
    }

    /// Delete a stored profile (`Ok(true)` if removed, `Ok(false)` if it didn't exist).
    pub fn delete(&self, id: &ProfileId) -> io::Result<bool> {
        match fs::remove_file(self.file_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Load every stored profile into the in-memory store, keeping ids.
    /// Returns how many profiles were adopted.
    pub fn hydrate(&self, store: &ProfileStore) -> io::Result<usize> {
        let profiles = self.list()?;
        let count = profiles.len();
        for profile in profiles {
            store.adopt(profile);
        }
        Ok(count)
    }
}
