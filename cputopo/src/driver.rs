//! Capability interface implemented by platform drivers.
//!
//! A driver reads whatever its platform offers (procfs, sysctl, kstat,
//! performance counters, ...) and hands the engine raw topology lists and
//! cumulative counters. The engine never interprets driver failures; it
//! wraps them with the name of the query and passes them on.

use std::collections::{HashMap, HashSet};

use crate::error::DriverResult;
use crate::identifier::ProcessorIdentifier;
use crate::model::{LogicalProcessor, PhysicalProcessor, ProcessorCache, TickSnapshot};

/// Source of raw processor data for one host.
///
/// Topology methods are called once, when a
/// [`CentralProcessor`](crate::CentralProcessor) is built. Tick methods are
/// called on every load query. Frequency and counter methods are called
/// through a memoized cache whose expiration the embedder configures.
pub trait CpuDriver: Send + Sync {
    /// Every logical processor on the host. Must not be empty.
    fn logical_processors(&self) -> DriverResult<Vec<LogicalProcessor>>;

    /// Physical cores, when the platform enumerates them directly.
    fn physical_processors(&self) -> DriverResult<Option<Vec<PhysicalProcessor>>> {
        Ok(None)
    }

    /// Free-text model string per logical processor number, for platforms
    /// that identify hybrid core types only by name.
    fn processor_id_strings(&self) -> DriverResult<Option<HashMap<u32, String>>> {
        Ok(None)
    }

    /// Cache descriptors, duplicates allowed.
    fn processor_caches(&self) -> DriverResult<Option<HashSet<ProcessorCache>>> {
        Ok(None)
    }

    fn processor_identifier(&self) -> DriverResult<ProcessorIdentifier>;

    /// Lowercase CPUID feature flag names, used to build a processor ID when
    /// the platform reports none.
    fn feature_flags(&self) -> DriverResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Hardware capability word (e.g. `AT_HWCAP`), 0 when unavailable.
    fn hwcap(&self) -> DriverResult<u64> {
        Ok(0)
    }

    /// Cumulative ticks for the whole system.
    fn system_ticks(&self) -> DriverResult<TickSnapshot>;

    /// Cumulative ticks per logical processor, in processor number order.
    fn per_core_ticks(&self) -> DriverResult<Vec<TickSnapshot>>;

    /// Maximum frequency in Hz, -1 if unknown.
    fn max_freq_hz(&self) -> DriverResult<i64>;

    /// Current frequency per logical processor in Hz, -1 entries if unknown.
    fn current_freq_hz(&self) -> DriverResult<Vec<i64>>;

    fn context_switches(&self) -> DriverResult<u64>;

    fn interrupts(&self) -> DriverResult<u64>;

    /// Up to three load averages (1, 5, 15 minutes). Negative entries mean
    /// the average is not available.
    fn system_load_average(&self, nelem: usize) -> DriverResult<Vec<f64>> {
        Ok(vec![-1.0; nelem])
    }
}
