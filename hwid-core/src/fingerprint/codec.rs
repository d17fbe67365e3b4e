//! Fingerprint Serializer
//!
//! The persisted fingerprint is the current suffix of a [`BlockSet`] written as
//! consecutive little-endian u32 words. There is no header or version byte:
//! the layout stays byte-compatible with fingerprints stored by earlier
//! releases. The text form is standard base64 of the same bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::block::Block;
use super::block_set::BlockSet;
use crate::constants::block::BLOCK_SIZE;
use crate::error::{HwidError, Result};

/// Serialize the current suffix of `set`
pub fn to_bytes(set: &BlockSet) -> Vec<u8> {
    encode_blocks(set.current())
}

/// Serialize an arbitrary block slice in order
pub fn encode_blocks(blocks: &[Block]) -> Vec<u8> {
    let mut out = Vec::with_capacity(blocks.len() * BLOCK_SIZE);
    for block in blocks {
        out.extend_from_slice(&block.to_le_bytes());
    }
    out
}

/// Check the structural invariant of a serialized fingerprint
pub fn validate_len(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() || bytes.len() % BLOCK_SIZE != 0 {
        return Err(HwidError::malformed(bytes.len()));
    }
    Ok(())
}

/// Decode a serialized fingerprint into raw block values
///
/// The type tag of each value is `value & 3`.
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    validate_len(bytes)?;
    Ok(bytes
        .chunks_exact(BLOCK_SIZE)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Base64 text form of serialized bytes
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text and validate the result
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| HwidError::InvalidEncoding(e.to_string()))?;
    validate_len(&bytes)?;
    Ok(bytes)
}

// ============================================================================
// Fingerprint value type
// ============================================================================

/// Serialized machine fingerprint
///
/// Built from a [`BlockSet`] (possibly empty) or parsed from bytes/text
/// (always validated, never empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Fingerprint of the current suffix of `set`
    pub fn from_block_set(set: &BlockSet) -> Self {
        Self { bytes: to_bytes(set) }
    }

    /// Validate and wrap serialized bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        validate_len(&bytes)?;
        Ok(Self { bytes })
    }

    /// Parse the base64 text form
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            bytes: from_base64(text)?,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decoded blocks in serialized order
    pub fn blocks(&self) -> Vec<Block> {
        self.bytes
            .chunks_exact(BLOCK_SIZE)
            .map(|c| Block::from_value(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect()
    }

    /// Number of blocks
    pub fn block_count(&self) -> usize {
        self.bytes.len() / BLOCK_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        to_base64(&self.bytes)
    }

    /// Lowercase hex, for logs and the CLI
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for Fingerprint {
    type Err = HwidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Only non-empty fingerprints serialize; an empty one has no valid text form
impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.is_empty() {
            return Err(ser::Error::custom(HwidError::malformed(0)));
        }
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}
