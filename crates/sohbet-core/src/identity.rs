//! Per-device session identity
//!
//! One opaque identifier scopes the conversation on the remote service.
//! Stored in ~/.sohbet/session.json with secure permissions; generated on
//! first use and stable across runs. When no persistent storage is
//! available the identity degrades to the empty string and the session is
//! unscoped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::paths;

/// On-disk shape of the persisted identity
#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// The per-device conversation identifier
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    value: String,
}

impl SessionIdentity {
    /// Load the persisted identity, generating and persisting one on first use
    pub fn load_or_create() -> Self {
        Self::load_from(paths::identity_file())
    }

    /// Same as [`load_or_create`](Self::load_or_create) with an explicit file location
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load_or_create(&path) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Session identity unavailable, running unscoped");
                Self {
                    value: String::new(),
                }
            }
        }
    }

    /// The opaque identifier; empty means the session is unscoped
    pub fn get(&self) -> &str {
        &self.value
    }

    /// Whether a persisted identifier exists for this device
    pub fn is_scoped(&self) -> bool {
        !self.value.is_empty()
    }

    fn try_load_or_create(path: &Path) -> Result<Self> {
        // An unreadable or corrupt file counts as absent; regenerate.
        if let Ok(contents) = fs::read_to_string(path) {
            if let Ok(stored) = serde_json::from_str::<StoredIdentity>(&contents) {
                if !stored.session_id.is_empty() {
                    return Ok(Self {
                        value: stored.session_id,
                    });
                }
            }
            tracing::warn!(path = %path.display(), "Discarding unreadable session identity file");
        }

        let value = Uuid::new_v4().to_string();
        Self::persist(path, &value)?;
        tracing::info!("Created new session identity");
        Ok(Self { value })
    }

    /// Write the identity atomically with restrictive permissions
    fn persist(path: &Path, value: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let contents = serde_json::to_string_pretty(&StoredIdentity {
            session_id: value.to_string(),
        })?;
        fs::write(&temp_path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = fs::metadata(&temp_path) {
                let mut permissions = metadata.permissions();
                permissions.set_mode(0o600);
                let _ = fs::set_permissions(&temp_path, permissions);
            }
        }

        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
