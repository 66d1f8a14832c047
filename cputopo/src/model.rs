//! Topology and tick data model shared by drivers and the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One schedulable hardware thread as reported by the operating system.
///
/// `core_number` and `package_number` are OS-relative and only identify a
/// physical core when read together as a `(package, core)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalProcessor {
    /// Zero-based, unique across the host.
    pub processor_number: u32,
    pub core_number: u32,
    pub package_number: u32,
    pub numa_node: u32,
    /// Windows processor group; 0 on platforms without groups.
    pub processor_group: u32,
}

impl LogicalProcessor {
    /// Logical processor on NUMA node 0, processor group 0.
    pub fn new(processor_number: u32, core_number: u32, package_number: u32) -> Self {
        Self::with_numa(processor_number, core_number, package_number, 0, 0)
    }

    pub fn with_numa(
        processor_number: u32,
        core_number: u32,
        package_number: u32,
        numa_node: u32,
        processor_group: u32,
    ) -> Self {
        Self {
            processor_number,
            core_number,
            package_number,
            numa_node,
            processor_group,
        }
    }

    /// Composite key identifying the physical core hosting this processor.
    pub fn core_key(&self) -> CoreKey {
        CoreKey::new(self.package_number, self.core_number)
    }
}

impl fmt::Display for LogicalProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu{} (package {}, core {}, node {}, group {})",
            self.processor_number,
            self.package_number,
            self.core_number,
            self.numa_node,
            self.processor_group
        )
    }
}

/// `(package, core)` packed into one `u64`, package in the upper half.
///
/// Ordering by the packed value orders by package first, then core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreKey(u64);

impl CoreKey {
    pub fn new(package_number: u32, core_number: u32) -> Self {
        Self((u64::from(package_number) << 32) | u64::from(core_number))
    }

    pub fn package_number(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn core_number(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

/// One physical execution core, possibly hosting several logical processors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalProcessor {
    pub package_number: u32,
    pub core_number: u32,
    /// 0 for the baseline core class. Non-zero values mark a distinct core
    /// class on hybrid parts; see [`crate::derive::derive_from_text_markers`].
    pub efficiency_class: u32,
    /// Free-text model marker, empty when the platform has none.
    pub id_string: String,
}

impl PhysicalProcessor {
    pub fn new(package_number: u32, core_number: u32) -> Self {
        Self {
            package_number,
            core_number,
            efficiency_class: 0,
            id_string: String::new(),
        }
    }

    pub fn core_key(&self) -> CoreKey {
        CoreKey::new(self.package_number, self.core_number)
    }
}

/// Kind of data held by a processor cache.
///
/// Declaration order is significant: it is the ordinal used when ordering
/// caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    Unified,
    Instruction,
    Data,
    Trace,
}

impl CacheType {
    pub fn ordinal(self) -> i64 {
        match self {
            CacheType::Unified => 0,
            CacheType::Instruction => 1,
            CacheType::Data => 2,
            CacheType::Trace => 3,
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheType::Unified => "Unified",
            CacheType::Instruction => "Instruction",
            CacheType::Data => "Data",
            CacheType::Trace => "Trace",
        };
        f.write_str(name)
    }
}

/// A processor cache descriptor. Equality is structural over all fields, so
/// duplicates reported for every core collapse in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessorCache {
    pub level: u8,
    /// Ways of associativity, 0 when unknown.
    pub associativity: u8,
    pub line_size: u16,
    /// Size in bytes.
    pub cache_size: u32,
    pub cache_type: CacheType,
}

impl ProcessorCache {
    pub fn new(
        level: u8,
        associativity: u8,
        line_size: u16,
        cache_size: u32,
        cache_type: CacheType,
    ) -> Self {
        Self {
            level,
            associativity,
            line_size,
            cache_size,
            cache_type,
        }
    }
}

impl fmt::Display for ProcessorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L{} {} {} bytes, {}-way, {}-byte lines",
            self.level, self.cache_type, self.cache_size, self.associativity, self.line_size
        )
    }
}

/// Tick categories, in the order they appear in a [`TickSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickType {
    User,
    Nice,
    System,
    Idle,
    IoWait,
    Irq,
    SoftIrq,
    Steal,
}

impl TickType {
    /// Number of tick categories.
    pub const COUNT: usize = 8;

    pub const ALL: [TickType; Self::COUNT] = [
        TickType::User,
        TickType::Nice,
        TickType::System,
        TickType::Idle,
        TickType::IoWait,
        TickType::Irq,
        TickType::SoftIrq,
        TickType::Steal,
    ];

    /// Position of this category in a tick array.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Cumulative tick counters since boot, one per [`TickType`].
///
/// Units are platform-defined; only differences between two snapshots are
/// meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickSnapshot(pub [u64; TickType::COUNT]);

impl TickSnapshot {
    pub fn new(ticks: [u64; TickType::COUNT]) -> Self {
        Self(ticks)
    }

    pub fn get(&self, tick: TickType) -> u64 {
        self.0[tick.index()]
    }

    pub fn set(&mut self, tick: TickType, value: u64) {
        self.0[tick.index()] = value;
    }

    /// Sum of all categories.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, t| acc.saturating_add(*t))
    }
}

impl AsRef<[u64]> for TickSnapshot {
    fn as_ref(&self) -> &[u64] {
        &self.0
    }
}

impl From<[u64; TickType::COUNT]> for TickSnapshot {
    fn from(ticks: [u64; TickType::COUNT]) -> Self {
        Self(ticks)
    }
}
