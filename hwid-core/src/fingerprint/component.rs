//! Component types and their 2-bit block tags

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::block::TYPE_MASK;
use crate::error::{HwidError, Result};

/// Hardware signal a block was derived from
///
/// The discriminant is the tag stored in the low 2 bits of every block.
/// `Cpu` is 0 and the matching policy treats it as mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Cpu = 0,
    Host = 1,
    Mac = 2,
    Hdd = 3,
}

impl ComponentType {
    /// All component types in tag order
    pub const ALL: [ComponentType; 4] = [
        ComponentType::Cpu,
        ComponentType::Host,
        ComponentType::Mac,
        ComponentType::Hdd,
    ];

    /// The 2-bit tag value
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Index into per-type arrays
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a type by tag, rejecting anything outside 0-3
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Cpu),
            1 => Ok(Self::Host),
            2 => Ok(Self::Mac),
            3 => Ok(Self::Hdd),
            other => Err(HwidError::InvalidComponentType(other)),
        }
    }

    /// Type carried by the low bits of a raw block value
    pub fn of_value(value: u32) -> Self {
        match value & TYPE_MASK {
            0 => Self::Cpu,
            1 => Self::Host,
            2 => Self::Mac,
            _ => Self::Hdd,
        }
    }

    /// Human-readable name for CLI output
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Host => "Host name",
            Self::Mac => "Network adapter",
            Self::Hdd => "Storage volume",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cpu => "cpu",
            Self::Host => "host",
            Self::Mac => "mac",
            Self::Hdd => "hdd",
        };
        f.write_str(s)
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = HwidError;

    fn try_from(tag: u32) -> Result<Self> {
        Self::from_tag(tag)
    }
}
