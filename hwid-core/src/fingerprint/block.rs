//! Block Codec
//!
//! A block is the 32-bit compaction of one hardware reading: the top 30 bits
//! of the reading's SHA-1 digest with the component type tag in the low 2 bits.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

use super::component::ComponentType;
use crate::constants::block::{BLOCK_SIZE, TYPE_MASK};

/// One tagged, hashed hardware reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(u32);

impl Block {
    /// Hash a raw reading into a block of the given type
    ///
    /// Returns `None` for an empty reading; callers skip absent components
    /// instead of hashing nothing.
    pub fn encode(raw: &[u8], component: ComponentType) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let digest = Sha1::digest(raw);
        let mut value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        value &= !TYPE_MASK;
        value |= component.tag() & TYPE_MASK;

        Some(Self(value))
    }

    /// Wrap a raw value, e.g. one decoded from a serialized fingerprint
    pub fn from_value(value: u32) -> Self {
        Self(value)
    }

    /// Full 32-bit value (hash bits and tag)
    pub fn value(self) -> u32 {
        self.0
    }

    /// Component type carried by the tag bits
    pub fn component(self) -> ComponentType {
        ComponentType::of_value(self.0)
    }

    /// Serialized little-endian form
    pub fn to_le_bytes(self) -> [u8; BLOCK_SIZE] {
        self.0.to_le_bytes()
    }
}

impl From<Block> for u32 {
    fn from(block: Block) -> u32 {
        block.0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}/{}", self.0, self.component())
    }
}
