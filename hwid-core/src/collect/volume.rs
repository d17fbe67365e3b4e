//! Storage volume collector
//!
//! The reading is the concatenation of every filesystem UUID listed in
//! `/dev/disk/by-uuid`, sorted so enumeration order does not matter.

use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::ComponentCollector;
use crate::constants::paths::DISK_BY_UUID_DIR;
use crate::fingerprint::ComponentType;

/// Reads the set of volume UUIDs
#[derive(Debug, Clone)]
pub struct VolumeCollector {
    dir: PathBuf,
}

impl Default for VolumeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeCollector {
    pub fn new() -> Self {
        Self::with_dir(DISK_BY_UUID_DIR)
    }

    /// Collector listing `dir` instead of `/dev/disk/by-uuid`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ComponentCollector for VolumeCollector {
    fn component(&self) -> ComponentType {
        ComponentType::Hdd
    }

    fn fetch(&self) -> Vec<u8> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = ?self.dir, error = %e, "Cannot list volume UUIDs");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        names.concat().into_bytes()
    }
}
