//! Durable per-identity registration storage.
//!
//! One JSON file per identity under an explicit root directory. Writes go
//! through a temp-file-then-rename so readers never observe a partially
//! written record; a record that fails to parse is deleted and treated as
//! absent rather than propagated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PalmError, Result};
use crate::template::{DistanceVector, Template};

/// Longest accepted identity string.
const MAX_IDENTITY_LEN: usize = 64;

/// A template persisted and bound to an identity.
///
/// At most one live registration exists per identity; the identity is the
/// store's primary key. Unknown or missing fields fail deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Registration {
    pub identity: String,
    pub signature: String,
    pub normalized_distances: DistanceVector,
    pub raw_distances: DistanceVector,
    pub registered_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

/// Listing projection of a registration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSummary {
    pub identity: String,
    pub registered_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl From<&Registration> for RegistrationSummary {
    fn from(record: &Registration) -> Self {
        Self {
            identity: record.identity.clone(),
            registered_at: record.registered_at,
            last_used: record.last_used,
        }
    }
}

/// File-backed registration store rooted at an explicit directory.
///
/// Reads are lock-free: the atomic rename on write guarantees any file a
/// reader opens is a complete record. Write paths (register, delete, touch)
/// serialize per identity through a lock table, so concurrent matches against
/// the same identity cannot lose updates.
pub struct TemplateStore {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TemplateStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened template store");
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, identity: &str) -> PathBuf {
        self.root.join(format!("{identity}.json"))
    }

    fn lock_for(&self, identity: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load the registration for an identity.
    ///
    /// A record that fails to parse is deleted and reported as absent; parse
    /// errors never reach the caller.
    pub fn load(&self, identity: &str) -> Option<Registration> {
        if validate_identity(identity).is_err() {
            return None;
        }
        let path = self.record_path(identity);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(identity, error = %e, "Failed to read registration");
                return None;
            }
        };

        match serde_json::from_slice::<Registration>(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    identity,
                    path = %path.display(),
                    error = %e,
                    "Corrupt registration record, deleting"
                );
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "Failed to delete corrupt record");
                }
                None
            }
        }
    }

    /// Persist a registration durably.
    ///
    /// Writes to a temp file in the same directory and renames it into
    /// place, so a concurrent reader sees either the old record or the new
    /// one, never a partial write.
    pub fn save(&self, record: &Registration) -> Result<()> {
        validate_identity(&record.identity)?;
        let path = self.record_path(&record.identity);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| PalmError::Serialization(e.to_string()))?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!(identity = %record.identity, path = %path.display(), "Saved registration");
        Ok(())
    }

    /// Remove the registration for an identity. Returns whether one existed.
    pub fn delete(&self, identity: &str) -> bool {
        if validate_identity(identity).is_err() {
            return false;
        }
        let lock = self.lock_for(identity);
        let _guard = lock.lock().expect("identity lock poisoned");

        match fs::remove_file(self.record_path(identity)) {
            Ok(()) => {
                info!(identity, "Deleted registration");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(identity, error = %e, "Failed to delete registration");
                false
            }
        }
    }

    /// All valid registrations, skipping any record that fails to parse.
    ///
    /// A record registered mid-scan may or may not appear; open-set scans
    /// tolerate non-atomic snapshots.
    pub fn load_all(&self) -> Result<Vec<Registration>> {
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable record");
                    continue;
                }
            };
            match serde_json::from_slice::<Registration>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping corrupt record");
                }
            }
        }

        // Stable enumeration order for deterministic open-set tie breaks.
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(records)
    }

    /// Listing of all valid registrations.
    pub fn list_all(&self) -> Result<Vec<RegistrationSummary>> {
        Ok(self.load_all()?.iter().map(RegistrationSummary::from).collect())
    }

    /// Register a template under an identity.
    ///
    /// Fails with [`PalmError::AlreadyRegistered`] when a live record exists,
    /// leaving that record untouched. Both timestamps start at the current
    /// time.
    pub fn register(&self, identity: &str, template: &Template) -> Result<Registration> {
        validate_identity(identity)?;
        let lock = self.lock_for(identity);
        let _guard = lock.lock().expect("identity lock poisoned");

        if self.load(identity).is_some() {
            return Err(PalmError::AlreadyRegistered(identity.to_string()));
        }

        let now = Utc::now();
        let record = Registration {
            identity: identity.to_string(),
            signature: template.signature.clone(),
            normalized_distances: template.normalized_distances.clone(),
            raw_distances: template.raw_distances.clone(),
            registered_at: now,
            last_used: now,
        };
        self.save(&record)?;

        info!(identity, signature = %record.signature, "Registered palm");
        Ok(record)
    }

    /// Update `last_used` to the current time for a matched identity.
    ///
    /// Reloads under the identity lock so two concurrent matches against the
    /// same identity cannot lose each other's update.
    pub fn touch_last_used(&self, identity: &str) -> Result<Registration> {
        validate_identity(identity)?;
        let lock = self.lock_for(identity);
        let _guard = lock.lock().expect("identity lock poisoned");

        let mut record = self
            .load(identity)
            .ok_or_else(|| PalmError::NotRegistered(identity.to_string()))?;
        record.last_used = Utc::now();
        self.save(&record)?;
        Ok(record)
    }
}

/// Reject identities that are empty, oversized, or would escape the store
/// directory when used as a file name.
pub fn validate_identity(identity: &str) -> Result<()> {
    if identity.is_empty() {
        return Err(PalmError::InvalidIdentity {
            identity: identity.to_string(),
            reason: "must not be empty".into(),
        });
    }
    if identity.len() > MAX_IDENTITY_LEN {
        return Err(PalmError::InvalidIdentity {
            identity: identity.to_string(),
            reason: format!("longer than {MAX_IDENTITY_LEN} characters"),
        });
    }
    if !identity
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
    {
        return Err(PalmError::InvalidIdentity {
            identity: identity.to_string(),
            reason: "only ASCII letters, digits, '-', '_' and '+' are allowed".into(),
        });
    }
    Ok(())
}
