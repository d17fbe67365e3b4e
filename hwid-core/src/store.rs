//! Enrollment Storage and Persistence
//!
//! Keeps the fingerprint a machine was enrolled with, plus a short history of
//! verifications against it, in a JSON file under the user config directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::constants::limits::{MAX_FILE_SIZE, MAX_LABEL_LEN};
use crate::constants::paths::{user_config_dir, STORE_FILE};
use crate::error::{HwidError, Result};
use crate::fingerprint::{Fingerprint, MatchVerdict};

// ============================================================================
// Fingerprint Store
// ============================================================================

/// Persistent enrollment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintStore {
    /// Store format version for migration
    pub version: u32,

    /// Enrolled fingerprint, `None` until enrollment
    #[serde(default)]
    pub fingerprint: Option<Fingerprint>,

    /// Free-form name given at enrollment
    #[serde(default)]
    pub label: Option<String>,

    /// Enrollment timestamp (ms since epoch)
    #[serde(default)]
    pub enrolled_at: Option<u64>,

    /// Last verification timestamp (ms since epoch)
    #[serde(default)]
    pub last_verified_at: Option<u64>,

    /// Verifications recorded since enrollment
    #[serde(default)]
    pub verify_count: u64,

    #[serde(default)]
    pub last_verdict: Option<MatchVerdict>,
}

impl Default for FingerprintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintStore {
    pub const CURRENT_VERSION: u32 = 1;

    /// Empty, unenrolled store
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            fingerprint: None,
            label: None,
            enrolled_at: None,
            last_verified_at: None,
            verify_count: 0,
            last_verdict: None,
        }
    }

    /// Default store location: `<config dir>/fingerprint_store.json`
    pub fn default_path() -> Result<PathBuf> {
        let dir = user_config_dir()
            .ok_or_else(|| HwidError::config("Could not determine config directory"))?;
        Ok(dir.join(STORE_FILE))
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`; a missing file is an empty store
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "No fingerprint store found, starting empty");
            return Ok(Self::new());
        }

        let content = read_bounded(path)?;
        let mut store: Self = serde_json::from_str(&content)?;

        if store.version < Self::CURRENT_VERSION {
            warn!(
                old_version = store.version,
                new_version = Self::CURRENT_VERSION,
                "Migrating fingerprint store"
            );
            store = Self::migrate(store);
        }

        debug!(
            path = ?path,
            enrolled = store.is_enrolled(),
            verify_count = store.verify_count,
            "Loaded fingerprint store"
        );
        Ok(store)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save to `path` atomically, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        debug!(path = ?path, "Saved fingerprint store");
        Ok(())
    }

    fn migrate(mut store: Self) -> Self {
        // Version 0 files predate the verification history
        store.version = Self::CURRENT_VERSION;
        store
    }

    pub fn is_enrolled(&self) -> bool {
        self.fingerprint.is_some()
    }

    /// Enrolled fingerprint, or [`HwidError::NotEnrolled`]
    pub fn reference(&self) -> Result<&Fingerprint> {
        self.fingerprint.as_ref().ok_or(HwidError::NotEnrolled)
    }

    /// Replace the enrollment and reset the verification history
    pub fn enroll(&mut self, fingerprint: Fingerprint, label: Option<String>) -> Result<()> {
        if fingerprint.is_empty() {
            return Err(HwidError::malformed(0));
        }
        let label = label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        if let Some(ref l) = label {
            if l.chars().count() > MAX_LABEL_LEN {
                return Err(HwidError::invalid_config(
                    "label",
                    format!("longer than {} characters", MAX_LABEL_LEN),
                ));
            }
        }

        info!(blocks = fingerprint.block_count(), label = ?label, "Enrolled fingerprint");
        *self = Self {
            fingerprint: Some(fingerprint),
            label,
            enrolled_at: Some(current_timestamp_ms()),
            ..Self::new()
        };
        Ok(())
    }

    /// Record the outcome of a verification against the enrollment
    pub fn record_verification(&mut self, verdict: MatchVerdict) -> Result<()> {
        if !self.is_enrolled() {
            return Err(HwidError::NotEnrolled);
        }
        self.last_verified_at = Some(current_timestamp_ms());
        self.verify_count += 1;
        self.last_verdict = Some(verdict);
        Ok(())
    }

    /// Forget the enrollment
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

// ============================================================================
// File helpers
// ============================================================================

/// Read a UTF-8 file, refusing anything over the size limit
pub(crate) fn read_bounded(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|source| HwidError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() > MAX_FILE_SIZE {
        warn!(path = ?path, size = metadata.len(), "Refusing oversized file");
        return Err(HwidError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: MAX_FILE_SIZE,
        });
    }

    fs::read_to_string(path).map_err(|source| HwidError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to a temp file next to `path`, fsync, then rename over `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source| HwidError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(write_err)
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
