//! Component Collectors
//!
//! Each collector wraps one OS query and hands back raw identifying bytes for
//! one component type. Collectors never fail: an unavailable component is an
//! empty reading. The builder only sees the [`ComponentCollector`] trait, so
//! tests swap in [`FixedCollector`] or mocks.

pub mod cpu;
pub mod host;
pub mod mac;
pub mod volume;

use tracing::warn;

use crate::error::Result;
use crate::fingerprint::ComponentType;

pub use cpu::{cpuinfo_identity, CpuCollector};
pub use host::{encode_host_name, HostCollector};
pub use mac::{parse_mac, MacCollector};
pub use volume::VolumeCollector;

/// Source of raw identifying bytes for one component type
#[cfg_attr(test, mockall::automock)]
pub trait ComponentCollector {
    /// Component type this collector reports
    fn component(&self) -> ComponentType;

    /// Single reading, empty when unavailable
    fn fetch(&self) -> Vec<u8>;

    /// Every reading the component offers (one per adapter, say)
    ///
    /// Defaults to the single [`fetch`](Self::fetch) reading; empty readings
    /// are dropped.
    fn fetch_all(&self) -> Vec<Vec<u8>> {
        let raw = self.fetch();
        if raw.is_empty() {
            Vec::new()
        } else {
            vec![raw]
        }
    }
}

// ============================================================================
// Fixed readings
// ============================================================================

/// Collector returning predetermined readings
///
/// Used for deterministic tests and for replaying captured readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedCollector {
    component: ComponentType,
    readings: Vec<Vec<u8>>,
}

impl FixedCollector {
    pub fn new(component: ComponentType, readings: Vec<Vec<u8>>) -> Self {
        Self { component, readings }
    }

    /// Collector with exactly one reading
    pub fn single(component: ComponentType, reading: impl Into<Vec<u8>>) -> Self {
        Self::new(component, vec![reading.into()])
    }

    /// Collector for an absent component
    pub fn empty(component: ComponentType) -> Self {
        Self::new(component, Vec::new())
    }
}

impl ComponentCollector for FixedCollector {
    fn component(&self) -> ComponentType {
        self.component
    }

    fn fetch(&self) -> Vec<u8> {
        self.readings.first().cloned().unwrap_or_default()
    }

    fn fetch_all(&self) -> Vec<Vec<u8>> {
        self.readings.iter().filter(|r| !r.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Collector set
// ============================================================================

/// One collector per component type, in the order the builder queries them
pub struct CollectorSet {
    cpu: Box<dyn ComponentCollector>,
    host: Box<dyn ComponentCollector>,
    mac: Box<dyn ComponentCollector>,
    hdd: Box<dyn ComponentCollector>,
}

impl CollectorSet {
    pub fn new(
        cpu: Box<dyn ComponentCollector>,
        host: Box<dyn ComponentCollector>,
        mac: Box<dyn ComponentCollector>,
        hdd: Box<dyn ComponentCollector>,
    ) -> Self {
        let set = Self { cpu, host, mac, hdd };
        for ty in ComponentType::ALL {
            let reported = set.get(ty).component();
            if reported != ty {
                warn!(slot = %ty, reported = %reported, "Collector reports a different component type");
            }
        }
        set
    }

    /// Native collectors for the running machine
    pub fn system() -> Self {
        Self::new(
            create_collector(ComponentType::Cpu),
            create_collector(ComponentType::Host),
            create_collector(ComponentType::Mac),
            create_collector(ComponentType::Hdd),
        )
    }

    /// Collector occupying the slot for `component`
    pub fn get(&self, component: ComponentType) -> &dyn ComponentCollector {
        match component {
            ComponentType::Cpu => self.cpu.as_ref(),
            ComponentType::Host => self.host.as_ref(),
            ComponentType::Mac => self.mac.as_ref(),
            ComponentType::Hdd => self.hdd.as_ref(),
        }
    }
}

/// Native collector for a component type
pub fn create_collector(component: ComponentType) -> Box<dyn ComponentCollector> {
    match component {
        ComponentType::Cpu => Box::new(CpuCollector),
        ComponentType::Host => Box::new(HostCollector::new()),
        ComponentType::Mac => Box::new(MacCollector::new()),
        ComponentType::Hdd => Box::new(VolumeCollector::new()),
    }
}

/// Native collector looked up by raw tag
pub fn create_collector_by_tag(tag: u32) -> Result<Box<dyn ComponentCollector>> {
    Ok(create_collector(ComponentType::from_tag(tag)?))
}
