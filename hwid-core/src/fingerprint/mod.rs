//! Machine Fingerprinting
//!
//! Turns raw hardware readings into a compact, order-tolerant fingerprint
//! and decides whether a presented fingerprint belongs to this machine.
//!
//! # Pipeline
//!
//! 1. **Collect** - one raw reading per component (see [`crate::collect`])
//! 2. **Encode** - each reading hashes to a 32-bit [`Block`]: the top 30 bits
//!    of its SHA-1 digest plus a 2-bit [`ComponentType`] tag
//! 3. **Store** - blocks go into a bounded [`BlockSet`] with a legacy prefix
//!    (older CPU normalizations, comparison only) and a current suffix
//! 4. **Serialize** - the current suffix as little-endian words, usually
//!    wrapped in base64 ([`Fingerprint`])
//! 5. **Match** - [`MatchEngine`] compares reference blocks with a
//!    candidate's bytes, tolerating drift in one non-CPU component type
//!
//! # Compatibility
//!
//! The serialized form carries no version header. Its words are exactly the
//! block values in current-suffix order, so fingerprints stay readable by
//! every release that hashes the same way.

pub mod block;
pub mod block_set;
pub mod builder;
pub mod codec;
pub mod component;
pub mod matcher;

pub use block::Block;
pub use block_set::{BlockSet, InsertOutcome};
pub use builder::{
    is_virtual_oui, BuildPhase, BuildTrace, BuilderOptions, CpuMethod, FingerprintBuilder,
    TraceEntry, CURRENT_CPU_METHOD, LEGACY_CPU_METHODS,
};
pub use codec::Fingerprint;
pub use component::ComponentType;
pub use matcher::{MatchEngine, MatchPolicy, MatchReport, MatchVerdict};

impl BlockSet {
    /// Serialized current suffix
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::to_bytes(self)
    }

    /// Current suffix as a [`Fingerprint`]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_block_set(self)
    }

    /// Default-policy match of `candidate` against the current blocks
    pub fn matches(&self, candidate: &[u8]) -> bool {
        matcher::is_match(self.current(), candidate)
    }

    /// Match against every block, legacy prefix included
    ///
    /// Accepts fingerprints issued by releases that hashed the CPU with
    /// feature flags intact.
    pub fn matches_any_format(&self, candidate: &[u8]) -> bool {
        matcher::is_match(self.blocks(), candidate)
    }
}
