//! Fingerprint Builder
//!
//! Queries every collector exactly once, in a fixed order, and feeds the
//! readings through the block codec into a [`BlockSet`]:
//!
//! | phase   | component | reading                                   |
//! |---------|-----------|-------------------------------------------|
//! | legacy  | CPU       | [`CpuMethod::Full`]                       |
//! | legacy  | CPU       | [`CpuMethod::NoOsxsave`]                  |
//! | current | CPU       | [`CpuMethod::NoFeatureFlags`]             |
//! | current | Host      | host name                                 |
//! | current | Mac       | every non-virtual adapter (with fallback) |
//! | current | Hdd       | volume UUID set                           |
//!
//! The two legacy CPU blocks reproduce what older format versions stored and
//! are only used for comparison. They are never serialized.
//!
//! No collector failure aborts the build; a missing component contributes no
//! blocks.

use tracing::{debug, trace};

use super::block::Block;
use super::block_set::{BlockSet, InsertOutcome};
use super::component::ComponentType;
use crate::collect::CollectorSet;
use crate::constants::capacity::MAX_BLOCKS;
use crate::constants::cpu::{
    APIC_ID_MASK, ATHLON_FIX_XOR, ATHLON_SIGNATURE, ATHLON_SIGNATURE_MASK, OSXSAVE_BIT,
    RAW_READING_LEN,
};
use crate::constants::mac::{MIN_ADDRESS_LEN, VIRTUAL_OUIS};

// ============================================================================
// CPU normalization
// ============================================================================

/// How feature flags are treated before hashing the CPU reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMethod {
    /// Feature flags as reported
    Full,
    /// OSXSAVE cleared (the OS toggles it, not the silicon)
    NoOsxsave,
    /// All ECX feature flags cleared
    NoFeatureFlags,
}

/// CPU readings making up the legacy prefix, in order
pub const LEGACY_CPU_METHODS: [CpuMethod; 2] = [CpuMethod::Full, CpuMethod::NoOsxsave];

/// CPU reading that opens the current suffix
pub const CURRENT_CPU_METHOD: CpuMethod = CpuMethod::NoFeatureFlags;

impl CpuMethod {
    /// Normalize a raw CPUID leaf 1 reading
    ///
    /// Masks the per-core APIC id, applies the Athlon signature fix and the
    /// method's feature-flag masking. Readings that are not 16 bytes (non-x86
    /// identity text) are returned unchanged.
    pub fn normalize(self, raw: &[u8]) -> Vec<u8> {
        if raw.len() != RAW_READING_LEN {
            return raw.to_vec();
        }

        let mut regs = [0u32; 4];
        for (reg, chunk) in regs.iter_mut().zip(raw.chunks_exact(4)) {
            *reg = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let [mut eax, mut ebx, mut ecx, edx] = regs;

        if eax & ATHLON_SIGNATURE_MASK == ATHLON_SIGNATURE {
            eax ^= ATHLON_FIX_XOR;
        }
        ebx &= APIC_ID_MASK;

        match self {
            Self::Full => {}
            Self::NoOsxsave => ecx &= !OSXSAVE_BIT,
            Self::NoFeatureFlags => ecx = 0,
        }

        let mut out = Vec::with_capacity(RAW_READING_LEN);
        for reg in [eax, ebx, ecx, edx] {
            out.extend_from_slice(&reg.to_le_bytes());
        }
        out
    }
}

/// True when the address belongs to a hypervisor's virtual adapter range
pub fn is_virtual_oui(addr: &[u8]) -> bool {
    if addr.len() < MIN_ADDRESS_LEN {
        return false;
    }
    let oui = (u32::from(addr[0]) << 16) | (u32::from(addr[1]) << 8) | u32::from(addr[2]);
    VIRTUAL_OUIS.contains(&oui)
}

// ============================================================================
// Build trace
// ============================================================================

/// Which part of the block set a reading was offered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Legacy,
    Current,
}

/// One reading offered to the block set during a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub phase: BuildPhase,
    pub component: ComponentType,
    /// Reading as hashed (after normalization)
    pub raw: Vec<u8>,
    pub block: Option<Block>,
    pub outcome: InsertOutcome,
}

/// Readings offered during a build, in order
pub type BuildTrace = Vec<TraceEntry>;

// ============================================================================
// Builder
// ============================================================================

/// Builder tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Drop adapters with hypervisor OUIs (unless nothing else is present)
    pub skip_virtual_macs: bool,
    /// Total block capacity, legacy included
    pub max_blocks: usize,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            skip_virtual_macs: true,
            max_blocks: MAX_BLOCKS,
        }
    }
}

/// Produces one [`BlockSet`] per call from a fixed collector sequence
pub struct FingerprintBuilder {
    collectors: CollectorSet,
    options: BuilderOptions,
}

impl FingerprintBuilder {
    pub fn new(collectors: CollectorSet) -> Self {
        Self::with_options(collectors, BuilderOptions::default())
    }

    pub fn with_options(collectors: CollectorSet, options: BuilderOptions) -> Self {
        Self { collectors, options }
    }

    /// Builder over the running machine's native collectors
    pub fn system() -> Self {
        Self::new(CollectorSet::system())
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Run the collector sequence and return the resulting blocks
    pub fn build(&self) -> BlockSet {
        self.build_traced().0
    }

    /// Like [`build`](Self::build), also returning every reading offered
    pub fn build_traced(&self) -> (BlockSet, BuildTrace) {
        let mut session = Session {
            set: BlockSet::with_max_blocks(self.options.max_blocks),
            trace: Vec::new(),
            phase: BuildPhase::Legacy,
        };

        let cpu_readings = self.collectors.get(ComponentType::Cpu).fetch_all();

        for method in LEGACY_CPU_METHODS {
            for raw in &cpu_readings {
                session.offer(method.normalize(raw), ComponentType::Cpu);
            }
        }
        session.set.seal_legacy();
        session.phase = BuildPhase::Current;

        for raw in &cpu_readings {
            session.offer(CURRENT_CPU_METHOD.normalize(raw), ComponentType::Cpu);
        }

        for raw in self.collectors.get(ComponentType::Host).fetch_all() {
            session.offer(raw, ComponentType::Host);
        }

        self.add_mac_addresses(&mut session);

        for raw in self.collectors.get(ComponentType::Hdd).fetch_all() {
            session.offer(raw, ComponentType::Hdd);
        }

        debug!(
            legacy = session.set.start_index(),
            current = session.set.current().len(),
            counts = ?session.set.current_counts(),
            "Built machine block set"
        );

        (session.set, session.trace)
    }

    fn add_mac_addresses(&self, session: &mut Session) {
        let addresses = self.collectors.get(ComponentType::Mac).fetch_all();
        let before = session.set.len();
        let mut last_seen: Option<&Vec<u8>> = None;

        for addr in &addresses {
            last_seen = Some(addr);
            if addr.len() < MIN_ADDRESS_LEN {
                continue;
            }
            if self.options.skip_virtual_macs && is_virtual_oui(addr) {
                trace!(oui = ?&addr[..MIN_ADDRESS_LEN], "Skipping virtual adapter");
                continue;
            }
            session.offer(addr.clone(), ComponentType::Mac);
        }

        // Only virtual adapters: keep the last one rather than no MAC at all
        if session.set.len() == before {
            if let Some(addr) = last_seen.filter(|a| a.len() >= MIN_ADDRESS_LEN) {
                debug!("No physical adapter found, using last virtual adapter");
                session.offer(addr.clone(), ComponentType::Mac);
            }
        }
    }
}

struct Session {
    set: BlockSet,
    trace: BuildTrace,
    phase: BuildPhase,
}

impl Session {
    fn offer(&mut self, raw: Vec<u8>, component: ComponentType) {
        let block = Block::encode(&raw, component);
        let outcome = match block {
            Some(block) => self.set.push(block),
            None => InsertOutcome::Absent,
        };
        trace!(phase = ?self.phase, component = %component, outcome = ?outcome, "Reading offered");
        self.trace.push(TraceEntry {
            phase: self.phase,
            component,
            raw,
            block,
            outcome,
        });
    }
}
