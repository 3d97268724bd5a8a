//! Identity persistence
//!
//! The core treats storage as one opaque slot holding a single identity
//! record. Nothing is encrypted here; the record is rebuilt through the
//! identity deriver on load.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::account::identity::Identity;
use crate::error::{Error, Result};

/// The persisted identity record
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    /// Absent for identities imported by private key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    pub private_key_hex: String,
    pub eth_address: String,
    pub chain_address: String,
}

impl StoredIdentity {
    /// Capture an identity for persistence
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            mnemonic: identity.mnemonic().map(str::to_string),
            private_key_hex: identity.key_pair().private_key().to_hex().to_string(),
            eth_address: identity.eth_address().to_string(),
            chain_address: identity.chain_address().to_string(),
        }
    }

    /// Rebuild the identity from the stored private key under `hrp`
    pub fn to_identity(&self, hrp: &str) -> Result<Identity> {
        let mut identity = Identity::from_private_key_with_hrp(&self.private_key_hex, hrp)?;
        if let Some(phrase) = &self.mnemonic {
            identity = identity.with_mnemonic(phrase)?;
        }

        if identity.eth_address() != self.eth_address.to_lowercase()
            || identity.chain_address() != self.chain_address.to_lowercase()
        {
            warn!(
                eth_address = %identity.eth_address(),
                chain_address = %identity.chain_address(),
                "Stored addresses disagree with the stored key, using the derived addresses"
            );
        }

        Ok(identity)
    }
}

impl Drop for StoredIdentity {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.private_key_hex.zeroize();
        if let Some(phrase) = self.mnemonic.as_mut() {
            phrase.zeroize();
        }
    }
}

impl std::fmt::Debug for StoredIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredIdentity")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .field("private_key_hex", &"[REDACTED]")
            .field("eth_address", &self.eth_address)
            .field("chain_address", &self.chain_address)
            .finish()
    }
}

/// Single-slot identity storage
pub trait IdentityStore: Send + Sync {
    /// Load the stored identity, if any
    fn load(&self) -> Result<Option<Identity>>;

    /// Replace the stored identity
    fn save(&self, identity: &Identity) -> Result<()>;

    /// Remove the stored identity
    fn clear(&self) -> Result<()>;
}

/// In-memory identity store
pub struct InMemoryIdentityStore {
    hrp: String,
    slot: RwLock<Option<StoredIdentity>>,
}

impl InMemoryIdentityStore {
    pub fn new(hrp: impl Into<String>) -> Self {
        Self {
            hrp: hrp.into(),
            slot: RwLock::new(None),
        }
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HRP)
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn load(&self) -> Result<Option<Identity>> {
        let slot = self
            .slot
            .read()
            .map_err(|_| Error::Storage("identity slot lock poisoned".to_string()))?;
        slot.as_ref().map(|record| record.to_identity(&self.hrp)).transpose()
    }

    fn save(&self, identity: &Identity) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| Error::Storage("identity slot lock poisoned".to_string()))?;
        *slot = Some(StoredIdentity::from_identity(identity));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| Error::Storage("identity slot lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// Identity store backed by one JSON file
pub struct JsonFileIdentityStore {
    path: PathBuf,
    hrp: String,
}

impl JsonFileIdentityStore {
    pub fn new(path: impl Into<PathBuf>, hrp: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hrp: hrp.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for JsonFileIdentityStore {
    fn load(&self) -> Result<Option<Identity>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => zeroize::Zeroizing::new(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        // serde_json errors carry positions, not content
        let record: StoredIdentity = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), "Loaded identity record");
        record.to_identity(&self.hrp).map(Some)
    }

    fn save(&self, identity: &Identity) -> Result<()> {
        let record = StoredIdentity::from_identity(identity);
        let json = zeroize::Zeroizing::new(serde_json::to_string_pretty(&record)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        write_private(&self.path, json.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), chain_address = %identity.chain_address(), "Saved identity record");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Write the record readable by the owner only; it holds the key in plaintext
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        // mode only applies on creation
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(contents)?;
        file.sync_all()
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)
    }
}
