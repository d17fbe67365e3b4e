//! CPU identity collector
//!
//! On x86 the reading is CPUID leaf 1 (version information and feature
//! flags) as EAX, EBX, ECX, EDX in little-endian order. Other architectures
//! have no CPUID, so the identity lines of `/proc/cpuinfo` stand in.

use super::ComponentCollector;
use crate::fingerprint::ComponentType;

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
use crate::constants::paths::PROC_CPUINFO;
use crate::constants::cpu::CPUINFO_IDENTITY_KEYS;

/// Reads the processor signature of the running machine
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuCollector;

impl ComponentCollector for CpuCollector {
    fn component(&self) -> ComponentType {
        ComponentType::Cpu
    }

    fn fetch(&self) -> Vec<u8> {
        read_cpu_signature()
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn read_cpu_signature() -> Vec<u8> {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::__cpuid;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::__cpuid;

    use crate::constants::cpu::{CPUID_VERSION_LEAF, RAW_READING_LEN};

    // SAFETY: leaf 1 is supported by every processor Rust's x86 targets run on.
    #[allow(unused_unsafe)]
    let regs = unsafe { __cpuid(CPUID_VERSION_LEAF) };

    let mut out = Vec::with_capacity(RAW_READING_LEN);
    for reg in [regs.eax, regs.ebx, regs.ecx, regs.edx] {
        out.extend_from_slice(&reg.to_le_bytes());
    }
    out
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn read_cpu_signature() -> Vec<u8> {
    match std::fs::read_to_string(PROC_CPUINFO) {
        Ok(text) => cpuinfo_identity(&text),
        Err(e) => {
            tracing::debug!(error = %e, "cpuinfo unavailable");
            Vec::new()
        }
    }
}

/// Identity lines of the first processor stanza of `/proc/cpuinfo`
///
/// Per-core values (processor number, clock, bogomips, APIC ids) are left
/// out so the reading is the same whichever core answers. Returns empty when
/// no identity key is present.
pub fn cpuinfo_identity(text: &str) -> Vec<u8> {
    let mut out = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if out.is_empty() {
                continue;
            }
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if CPUINFO_IDENTITY_KEYS.contains(&key) {
            out.push_str(key);
            out.push(':');
            out.push_str(value.trim());
            out.push('\n');
        }
    }

    out.into_bytes()
}
