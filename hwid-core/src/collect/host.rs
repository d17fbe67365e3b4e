//! Host name collector

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ComponentCollector;
use crate::constants::paths::PROC_HOSTNAME;
use crate::fingerprint::ComponentType;

/// Reads the machine's host name
///
/// The reading is the upper-cased name encoded as UTF-16LE, which keeps
/// blocks identical to those stored by earlier releases.
#[derive(Debug, Clone)]
pub struct HostCollector {
    fallback_path: PathBuf,
}

impl Default for HostCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCollector {
    pub fn new() -> Self {
        Self {
            fallback_path: PathBuf::from(PROC_HOSTNAME),
        }
    }

    fn host_name(&self) -> Option<String> {
        resolve_host_name(system_host_name(), &self.fallback_path)
    }
}

fn resolve_host_name(system: Option<String>, fallback_path: &Path) -> Option<String> {
    if system.is_some() {
        return system;
    }

    debug!(path = ?fallback_path, "gethostname failed, trying fallback");
    fs::read_to_string(fallback_path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ComponentCollector for HostCollector {
    fn component(&self) -> ComponentType {
        ComponentType::Host
    }

    fn fetch(&self) -> Vec<u8> {
        self.host_name()
            .map(|name| encode_host_name(&name))
            .unwrap_or_default()
    }
}

/// Upper-case `name` and encode it as UTF-16LE
pub fn encode_host_name(name: &str) -> Vec<u8> {
    name.trim()
        .to_uppercase()
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}

#[cfg(unix)]
fn system_host_name() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes for the duration of the call.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return None;
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(not(unix))]
fn system_host_name() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|s| !s.is_empty())
}
