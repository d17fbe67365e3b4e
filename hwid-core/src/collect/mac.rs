//! Network adapter collector
//!
//! Lists the physical addresses of Ethernet interfaces under
//! `/sys/class/net`. Loopback, wireless and non-Ethernet link types are
//! skipped. Filtering of hypervisor adapters happens in the builder so it can
//! fall back to a virtual address when nothing else exists.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::ComponentCollector;
use crate::constants::mac::ARPHRD_ETHER;
use crate::constants::paths::NET_CLASS_DIR;
use crate::fingerprint::ComponentType;

/// Reads MAC addresses of the machine's Ethernet adapters
#[derive(Debug, Clone)]
pub struct MacCollector {
    root: PathBuf,
}

impl Default for MacCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MacCollector {
    pub fn new() -> Self {
        Self::with_root(NET_CLASS_DIR)
    }

    /// Collector reading interfaces from `root` instead of sysfs
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ethernet_addresses(&self) -> Vec<Vec<u8>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = ?self.root, error = %e, "Cannot list network interfaces");
                return Vec::new();
            }
        };

        let mut interfaces: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        interfaces.sort();

        interfaces
            .iter()
            .filter(|path| is_ethernet(path))
            .filter_map(|path| {
                let text = fs::read_to_string(path.join("address")).ok()?;
                let addr = parse_mac(text.trim())?;
                if addr.iter().all(|b| *b == 0) {
                    trace!(interface = ?path, "Skipping all-zero address");
                    return None;
                }
                Some(addr)
            })
            .collect()
    }
}

impl ComponentCollector for MacCollector {
    fn component(&self) -> ComponentType {
        ComponentType::Mac
    }

    fn fetch(&self) -> Vec<u8> {
        self.ethernet_addresses().into_iter().next().unwrap_or_default()
    }

    fn fetch_all(&self) -> Vec<Vec<u8>> {
        self.ethernet_addresses()
    }
}

fn is_ethernet(iface: &Path) -> bool {
    if iface.file_name().map(|n| n == "lo").unwrap_or(false) {
        return false;
    }
    if iface.join("wireless").exists() || iface.join("phy80211").exists() {
        return false;
    }

    fs::read_to_string(iface.join("type"))
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .map(|t| t == ARPHRD_ETHER)
        .unwrap_or(false)
}

/// Parse a colon-separated hex address (`00:1b:21:0a:0b:0c`)
pub fn parse_mac(text: &str) -> Option<Vec<u8>> {
    let re = Regex::new(r"^[0-9a-fA-F]{2}(?::[0-9a-fA-F]{2})+$").ok()?;
    if !re.is_match(text) {
        return None;
    }

    text.split(':')
        .map(|octet| u8::from_str_radix(octet, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_iface(root: &Path, name: &str, link_type: &str, address: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{}\n", link_type)).unwrap();
        fs::write(dir.join("address"), format!("{}\n", address)).unwrap();
        dir
    }

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("00:1b:21:0A:0b:0c"),
            Some(vec![0x00, 0x1B, 0x21, 0x0A, 0x0B, 0x0C])
        );
        assert_eq!(parse_mac("00:1b"), Some(vec![0x00, 0x1B]));
        assert!(parse_mac("").is_none());
        assert!(parse_mac("00-1b-21-0a-0b-0c").is_none());
        assert!(parse_mac("zz:1b:21:0a:0b:0c").is_none());
        assert!(parse_mac("00:1b:").is_none());
    }

    #[test]
    fn test_lists_ethernet_sorted() {
        let root = tempfile::tempdir().unwrap();
        add_iface(root.path(), "eth1", "1", "00:1b:21:00:00:02");
        add_iface(root.path(), "eth0", "1", "00:1b:21:00:00:01");
        add_iface(root.path(), "lo", "772", "00:00:00:00:00:00");
        add_iface(root.path(), "tun0", "65534", "");

        let collector = MacCollector::with_root(root.path());
        let addrs = collector.fetch_all();
        assert_eq!(
            addrs,
            vec![
                vec![0x00, 0x1B, 0x21, 0x00, 0x00, 0x01],
                vec![0x00, 0x1B, 0x21, 0x00, 0x00, 0x02],
            ]
        );
        assert_eq!(collector.fetch(), addrs[0]);
    }

    #[test]
    fn test_skips_wireless_and_zero() {
        let root = tempfile::tempdir().unwrap();
        let wlan = add_iface(root.path(), "wlan0", "1", "a4:5e:60:00:00:01");
        fs::create_dir_all(wlan.join("wireless")).unwrap();
        add_iface(root.path(), "dummy0", "1", "00:00:00:00:00:00");

        assert!(MacCollector::with_root(root.path()).fetch_all().is_empty());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let collector = MacCollector::with_root(root.path().join("absent"));
        assert!(collector.fetch().is_empty());
        assert!(collector.fetch_all().is_empty());
    }
}
