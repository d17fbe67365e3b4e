//! Constants and configuration values for hwid
//!
//! Centralizes the block layout, capacity limits, matching thresholds and
//! system paths. Add new magic numbers here rather than inline.

/// System paths used by the native collectors and the config layer
pub mod paths {
    use std::path::PathBuf;

    /// Network interfaces (one directory per interface)
    pub const NET_CLASS_DIR: &str = "/sys/class/net";

    /// Filesystem UUID symlinks
    pub const DISK_BY_UUID_DIR: &str = "/dev/disk/by-uuid";

    /// CPU identity on non-x86 Linux
    pub const PROC_CPUINFO: &str = "/proc/cpuinfo";

    /// Kernel hostname, used when gethostname fails
    pub const PROC_HOSTNAME: &str = "/proc/sys/kernel/hostname";

    /// Name of the config directory under the user's config base
    pub const APP_DIR_NAME: &str = "hwid";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Enrollment store file name
    pub const STORE_FILE: &str = "fingerprint_store.json";

    /// Environment variable overriding the config directory
    pub const CONFIG_DIR_ENV: &str = "HWID_CONFIG_DIR";

    /// User configuration directory
    ///
    /// Resolution order: `HWID_CONFIG_DIR`, `XDG_CONFIG_HOME/hwid`,
    /// `HOME/.config/hwid`, then the platform config dir from `dirs`.
    pub fn user_config_dir() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return Some(PathBuf::from(dir));
            }
        }

        let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".config"))
        } else {
            dirs::config_dir()
        };

        base.map(|p| p.join(APP_DIR_NAME))
    }
}

/// Block bit layout
pub mod block {
    /// Low bits of a block carrying the component type tag
    pub const TYPE_MASK: u32 = 3;

    /// Serialized width of one block in bytes
    pub const BLOCK_SIZE: usize = 4;

    /// Number of distinct component types (2-bit tag)
    pub const COMPONENT_TYPE_COUNT: usize = 4;
}

/// Block capacity of a single fingerprinting session
pub mod capacity {
    /// Slots reserved for blocks produced by older format versions
    pub const LEGACY_SLOT_COUNT: usize = 8;

    /// Slots for blocks that end up in the serialized fingerprint
    pub const CURRENT_SLOT_COUNT: usize = 16;

    /// Hard cap on stored blocks (legacy + current)
    pub const MAX_BLOCKS: usize = CURRENT_SLOT_COUNT + LEGACY_SLOT_COUNT;
}

/// Tolerance policy defaults
pub mod matching {
    /// Matched component types that accept a fingerprint even when another
    /// present type did not match
    pub const MIN_MATCHED_TYPES: usize = 3;

    /// CPU identity must always match
    pub const REQUIRE_CPU: bool = true;
}

/// CPUID leaf 1 normalization
pub mod cpu {
    /// CPUID leaf holding version information and feature flags
    pub const CPUID_VERSION_LEAF: u32 = 1;

    /// Raw reading size: EAX, EBX, ECX, EDX as little-endian u32
    pub const RAW_READING_LEN: usize = 16;

    /// EBX bits 24-31 carry the initial APIC id, which differs per core
    pub const APIC_ID_MASK: u32 = 0x00FF_FFFF;

    /// ECX bit 27: OSXSAVE, toggled by the OS rather than the silicon
    pub const OSXSAVE_BIT: u32 = 1 << 27;

    /// Family/model bits of EAX checked for the Athlon misreport
    pub const ATHLON_SIGNATURE_MASK: u32 = 0xFF0;

    /// Signature value that triggers the fix
    pub const ATHLON_SIGNATURE: u32 = 0xFE0;

    /// Bit flipped in EAX to normalize the Athlon signature
    pub const ATHLON_FIX_XOR: u32 = 0x20;

    /// `/proc/cpuinfo` keys that identify the processor model rather than a core
    pub const CPUINFO_IDENTITY_KEYS: &[&str] = &[
        "vendor_id",
        "cpu family",
        "model",
        "model name",
        "stepping",
        "CPU implementer",
        "CPU architecture",
        "CPU variant",
        "CPU part",
        "CPU revision",
        "isa",
        "uarch",
    ];
}

/// Network adapter filtering
pub mod mac {
    /// Minimum address length needed to read an OUI
    pub const MIN_ADDRESS_LEN: usize = 3;

    /// ARPHRD_ETHER as reported by `/sys/class/net/<if>/type`
    pub const ARPHRD_ETHER: u32 = 1;

    /// OUIs assigned to hypervisor virtual adapters
    pub const VIRTUAL_OUIS: &[u32] = &[
        // VMware
        0x000569, 0x000C29, 0x001C14, 0x005056,
        // Microsoft
        0x0003FF, 0x000D3A, 0x00125A, 0x00155D, 0x0017FA, 0x001DD8, 0x002248, 0x0025AE,
        0x0050F2,
        // Parallels
        0x001C42,
        // Virtual Iron
        0x0021F6,
    ];
}

/// Input limits
pub mod limits {
    /// Maximum store/settings file size accepted on load
    pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

    /// Maximum enrollment label length
    pub const MAX_LABEL_LEN: usize = 128;
}
