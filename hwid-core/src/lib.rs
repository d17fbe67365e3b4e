//! hwid Core Library
//!
//! Machine fingerprints that survive ordinary hardware churn.
//!
//! # Features
//!
//! - **Collection**: CPU signature, host name, network adapters and volume
//!   UUIDs, each behind a mockable collector trait
//! - **Block codec**: 32-bit SHA-1 derived blocks tagged with their component
//!   type, serialized as little-endian words and base64
//! - **Tolerant matching**: CPU must match; one other component type may
//!   change without invalidating the fingerprint
//! - **Enrollment**: JSON store for the reference fingerprint and its
//!   verification history
//!
//! # Module Structure
//!
//! - `collect/` - native and fixed component collectors
//! - `fingerprint/` - blocks, block sets, codec, builder, matcher
//! - `store`, `settings` - persistence
//!
//! # Example
//!
//! ```no_run
//! use hwid_core::FingerprintBuilder;
//!
//! let blocks = FingerprintBuilder::system().build();
//! let fingerprint = blocks.fingerprint();
//! assert!(blocks.matches(fingerprint.as_bytes()));
//! println!("{}", fingerprint);
//! ```

// Grouped modules
pub mod collect;
pub mod fingerprint;

// Standalone modules
pub mod constants;
pub mod error;
pub mod settings;
pub mod store;

// Re-export error types
pub use error::{HwidError, Result};

// Re-export fingerprint types
pub use fingerprint::{
    Block, BlockSet, BuilderOptions, ComponentType, Fingerprint, FingerprintBuilder,
    InsertOutcome, MatchEngine, MatchPolicy, MatchReport, MatchVerdict,
};

// Re-export codec and matching functions
pub use fingerprint::codec::{from_base64, from_bytes, to_base64, to_bytes};
pub use fingerprint::matcher::{evaluate, is_match};

// Re-export collectors
pub use collect::{CollectorSet, ComponentCollector, FixedCollector};

// Re-export persistence
pub use settings::Settings;
pub use store::FingerprintStore;
