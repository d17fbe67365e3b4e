//! Tolerant Matching Engine
//!
//! Decides whether a serialized candidate fingerprint belongs to the machine
//! described by a set of reference blocks.
//!
//! # Policy
//!
//! Matching works per component type, not per block: a type counts as
//! matched when at least one of its reference blocks appears anywhere in the
//! candidate. Then:
//!
//! 1. **Rule A** - the CPU type must match.
//! 2. **Rule B** - every present type matched, or at least
//!    [`MIN_MATCHED_TYPES`] types matched.
//!
//! With the default policy one non-CPU component type may go fully stale
//! (all network adapters replaced, say) and the machine is still recognized.
//! Two simultaneous type changes are rejected.
//!
//! A structurally invalid candidate is not an error here; it simply does not
//! match.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use super::block::Block;
use super::codec;
use super::component::ComponentType;
use crate::constants::block::COMPONENT_TYPE_COUNT;
use crate::constants::matching::{MIN_MATCHED_TYPES, REQUIRE_CPU};
use crate::error::{HwidError, Result};

// ============================================================================
// Policy
// ============================================================================

/// Parameters of the tolerance rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Rule A: reject unless the CPU type matched
    #[serde(default = "default_require_cpu")]
    pub require_cpu: bool,
    /// Rule B threshold
    #[serde(default = "default_min_matched_types")]
    pub min_matched_types: usize,
}

fn default_require_cpu() -> bool {
    REQUIRE_CPU
}

fn default_min_matched_types() -> usize {
    MIN_MATCHED_TYPES
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            require_cpu: REQUIRE_CPU,
            min_matched_types: MIN_MATCHED_TYPES,
        }
    }
}

impl MatchPolicy {
    /// Reject thresholds that can never or always be met
    pub fn validate(&self) -> Result<()> {
        if self.min_matched_types == 0 || self.min_matched_types > COMPONENT_TYPE_COUNT {
            return Err(HwidError::invalid_config(
                "policy.min_matched_types",
                format!("{} is outside 1-{}", self.min_matched_types, COMPONENT_TYPE_COUNT),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Match Report
// ============================================================================

/// Outcome of comparing a candidate against the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchVerdict {
    /// Every present component type matched
    Exact,
    /// Some present type did not match, but enough others did
    Tolerated,
    /// Candidate bytes empty or not a multiple of 4
    Malformed,
    /// No CPU block matched
    CpuMismatch,
    /// Too few component types matched
    TooManyChanges,
}

impl MatchVerdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Exact | Self::Tolerated)
    }
}

impl fmt::Display for MatchVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "exact match",
            Self::Tolerated => "match within tolerance",
            Self::Malformed => "malformed fingerprint",
            Self::CpuMismatch => "CPU mismatch",
            Self::TooManyChanges => "too many component changes",
        };
        f.write_str(s)
    }
}

/// Per-type detail behind a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub verdict: MatchVerdict,
    /// Reference contains at least one block of the type, indexed by tag
    pub found: [bool; COMPONENT_TYPE_COUNT],
    /// At least one reference block of the type is in the candidate
    pub matched: [bool; COMPONENT_TYPE_COUNT],
}

impl MatchReport {
    /// Report for a candidate that could not be parsed
    pub fn malformed() -> Self {
        Self {
            verdict: MatchVerdict::Malformed,
            found: [false; COMPONENT_TYPE_COUNT],
            matched: [false; COMPONENT_TYPE_COUNT],
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// Number of component types present in the reference
    pub fn found_count(&self) -> usize {
        self.found.iter().filter(|f| **f).count()
    }

    /// Number of component types matched
    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|m| **m).count()
    }

    /// Types present in the reference that found no counterpart
    pub fn changed_components(&self) -> Vec<ComponentType> {
        ComponentType::ALL
            .into_iter()
            .filter(|ty| self.found[ty.index()] && !self.matched[ty.index()])
            .collect()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Applies a [`MatchPolicy`] to reference blocks and candidate bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
    policy: MatchPolicy,
}

impl MatchEngine {
    /// Engine with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Compare `candidate` bytes against `reference` and explain the result
    pub fn evaluate(&self, reference: &[Block], candidate: &[u8]) -> MatchReport {
        let candidate = match codec::from_bytes(candidate) {
            Ok(values) => values,
            Err(e) => {
                debug!(error = %e, "Candidate fingerprint rejected");
                return MatchReport::malformed();
            }
        };

        let mut found = [false; COMPONENT_TYPE_COUNT];
        let mut matched = [false; COMPONENT_TYPE_COUNT];

        for block in reference {
            let idx = block.component().index();
            found[idx] = true;
            if candidate.contains(&block.value()) {
                trace!(block = %block, "Reference block present in candidate");
                matched[idx] = true;
            }
        }

        let verdict = self.decide(&found, &matched);
        debug!(
            verdict = %verdict,
            found = ?found,
            matched = ?matched,
            "Fingerprint comparison complete"
        );

        MatchReport {
            verdict,
            found,
            matched,
        }
    }

    /// Boolean form of [`evaluate`](Self::evaluate)
    pub fn is_match(&self, reference: &[Block], candidate: &[u8]) -> bool {
        self.evaluate(reference, candidate).is_accepted()
    }

    fn decide(
        &self,
        found: &[bool; COMPONENT_TYPE_COUNT],
        matched: &[bool; COMPONENT_TYPE_COUNT],
    ) -> MatchVerdict {
        let cpu = ComponentType::Cpu.index();
        if self.policy.require_cpu && !matched[cpu] {
            return MatchVerdict::CpuMismatch;
        }

        let present = found.iter().filter(|f| **f).count();
        let hits = matched.iter().filter(|m| **m).count();

        // An empty reference has nothing to match against
        if hits == 0 {
            return MatchVerdict::TooManyChanges;
        }
        if hits == present {
            MatchVerdict::Exact
        } else if hits >= self.policy.min_matched_types {
            MatchVerdict::Tolerated
        } else {
            MatchVerdict::TooManyChanges
        }
    }
}

/// Default-policy match of `candidate` bytes against `reference` blocks
pub fn is_match(reference: &[Block], candidate: &[u8]) -> bool {
    MatchEngine::new().is_match(reference, candidate)
}

/// Default-policy report of `candidate` bytes against `reference` blocks
pub fn evaluate(reference: &[Block], candidate: &[u8]) -> MatchReport {
    MatchEngine::new().evaluate(reference, candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::codec::encode_blocks;

    fn block(raw: &str, ty: ComponentType) -> Block {
        Block::encode(raw.as_bytes(), ty).unwrap()
    }

    fn reference() -> Vec<Block> {
        vec![
            block("cpu", ComponentType::Cpu),
            block("HOST", ComponentType::Host),
            block("mac-1", ComponentType::Mac),
            block("mac-2", ComponentType::Mac),
            block("disk", ComponentType::Hdd),
        ]
    }

    #[test]
    fn test_reflexive() {
        let reference = reference();
        let report = evaluate(&reference, &encode_blocks(&reference));
        assert_eq!(report.verdict, MatchVerdict::Exact);
        assert_eq!(report.found_count(), 4);
        assert_eq!(report.matched_count(), 4);
        assert!(report.changed_components().is_empty());
    }

    #[test]
    fn test_malformed_candidates() {
        let reference = reference();
        assert!(!is_match(&reference, &[1, 2, 3]));
        assert!(!is_match(&reference, &[]));
        assert_eq!(evaluate(&reference, &[0; 5]).verdict, MatchVerdict::Malformed);
    }

    #[test]
    fn test_cpu_mandatory() {
        let candidate = vec![
            block("other cpu", ComponentType::Cpu),
            block("HOST", ComponentType::Host),
            block("mac-1", ComponentType::Mac),
            block("disk", ComponentType::Hdd),
        ];
        let report = evaluate(&reference(), &encode_blocks(&candidate));
        assert_eq!(report.verdict, MatchVerdict::CpuMismatch);
        assert_eq!(report.matched_count(), 3);
    }

    #[test]
    fn test_single_drift_tolerated() {
        let candidate = vec![
            block("cpu", ComponentType::Cpu),
            block("HOST", ComponentType::Host),
            block("mac-2", ComponentType::Mac),
            block("new disk", ComponentType::Hdd),
        ];
        let report = evaluate(&reference(), &encode_blocks(&candidate));
        assert_eq!(report.verdict, MatchVerdict::Tolerated);
        assert_eq!(report.changed_components(), vec![ComponentType::Hdd]);
    }

    #[test]
    fn test_missing_type_tolerated() {
        let candidate = vec![
            block("cpu", ComponentType::Cpu),
            block("HOST", ComponentType::Host),
            block("mac-1", ComponentType::Mac),
        ];
        assert!(is_match(&reference(), &encode_blocks(&candidate)));
    }

    #[test]
    fn test_double_drift_rejected() {
        let candidate = vec![
            block("cpu", ComponentType::Cpu),
            block("HOST", ComponentType::Host),
            block("mac-9", ComponentType::Mac),
            block("new disk", ComponentType::Hdd),
        ];
        let report = evaluate(&reference(), &encode_blocks(&candidate));
        assert_eq!(report.verdict, MatchVerdict::TooManyChanges);
        assert_eq!(
            report.changed_components(),
            vec![ComponentType::Mac, ComponentType::Hdd]
        );
    }

    #[test]
    fn test_position_independent() {
        let mut candidate = reference();
        candidate.reverse();
        assert!(is_match(&reference(), &encode_blocks(&candidate)));
    }

    #[test]
    fn test_partial_reference_all_matched() {
        // Machine without network adapters or volumes: two types, both match
        let reference = vec![block("cpu", ComponentType::Cpu), block("HOST", ComponentType::Host)];
        let report = evaluate(&reference, &encode_blocks(&reference));
        assert_eq!(report.verdict, MatchVerdict::Exact);
    }

    #[test]
    fn test_partial_reference_one_changed() {
        // Two types present, one changed: 1 of 2 matched and below threshold
        let reference = vec![block("cpu", ComponentType::Cpu), block("HOST", ComponentType::Host)];
        let candidate = vec![block("cpu", ComponentType::Cpu), block("RENAMED", ComponentType::Host)];
        assert!(!is_match(&reference, &encode_blocks(&candidate)));
    }

    #[test]
    fn test_empty_reference_never_matches() {
        let candidate = encode_blocks(&reference());
        assert_eq!(evaluate(&[], &candidate).verdict, MatchVerdict::CpuMismatch);
        let lenient = MatchEngine::with_policy(MatchPolicy { require_cpu: false, min_matched_types: 1 });
        assert!(!lenient.is_match(&[], &candidate));
    }

    #[test]
    fn test_custom_policy_without_cpu_rule() {
        let engine = MatchEngine::with_policy(MatchPolicy {
            require_cpu: false,
            min_matched_types: 3,
        });
        let candidate = vec![
            block("other cpu", ComponentType::Cpu),
            block("HOST", ComponentType::Host),
            block("mac-1", ComponentType::Mac),
            block("disk", ComponentType::Hdd),
        ];
        assert!(engine.is_match(&reference(), &encode_blocks(&candidate)));
    }

    #[test]
    fn test_policy_validation() {
        assert!(MatchPolicy::default().validate().is_ok());
        assert!(MatchPolicy { require_cpu: true, min_matched_types: 0 }.validate().is_err());
        assert!(MatchPolicy { require_cpu: true, min_matched_types: 5 }.validate().is_err());
    }
}
