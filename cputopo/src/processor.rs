//! The resolved view of a host's processors.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::cache_order::order_caches;
use crate::config::EngineConfig;
use crate::derive::Topology;
use crate::driver::CpuDriver;
use crate::error::{DriverResult, Result, TopologyError};
use crate::identifier::ProcessorIdentifier;
use crate::load;
use crate::memo::Memoized;
use crate::model::{LogicalProcessor, PhysicalProcessor, ProcessorCache, TickSnapshot};
use crate::procid::create_processor_id;

/// Most load averages a platform reports (1, 5 and 15 minutes).
pub const MAX_LOAD_AVERAGES: usize = 3;

fn query<T>(operation: &'static str, result: DriverResult<T>) -> Result<T> {
    result.map_err(|e| TopologyError::driver(operation, e))
}

fn memoize_query<T, F>(
    driver: &Arc<dyn CpuDriver>,
    operation: &'static str,
    expiration: Option<Duration>,
    fetch: F,
) -> Memoized<T>
where
    T: 'static,
    F: Fn(&dyn CpuDriver) -> DriverResult<T> + Send + Sync + 'static,
{
    let driver = Arc::clone(driver);
    Memoized::with_expiration(move || query(operation, fetch(driver.as_ref())), expiration)
}

/// A host's processor topology and load accessors.
///
/// Topology is queried from the driver once, in [`CentralProcessor::new`],
/// and never changes afterwards. Frequencies and counters go through a
/// memoized cache; tick snapshots are fetched fresh on every call. Values
/// cached separately may have been refreshed at different instants.
pub struct CentralProcessor {
    driver: Arc<dyn CpuDriver>,
    identifier: ProcessorIdentifier,
    topology: Topology,
    caches: Vec<ProcessorCache>,
    max_freq: Memoized<i64>,
    current_freq: Memoized<Vec<i64>>,
    context_switches: Memoized<u64>,
    interrupts: Memoized<u64>,
}

impl CentralProcessor {
    /// Query the driver and resolve the topology.
    ///
    /// Fails without exposing a partial topology if any construction-time
    /// query fails or the driver reports no logical processors.
    pub fn new(driver: Arc<dyn CpuDriver>, config: EngineConfig) -> Result<Self> {
        let logical = query("logical_processors", driver.logical_processors())?;
        let physical = query("physical_processors", driver.physical_processors())?;
        let id_strings = if physical.is_none() {
            query("processor_id_strings", driver.processor_id_strings())?
        } else {
            None
        };
        let topology = Topology::resolve(logical, physical, id_strings.as_ref())?;

        let caches = query("processor_caches", driver.processor_caches())?
            .map(|set| order_caches(&set))
            .unwrap_or_default();

        let mut identifier = query("processor_identifier", driver.processor_identifier())?;
        if identifier.processor_id().is_empty() {
            let flags = query("feature_flags", driver.feature_flags())?;
            let hwcap = query("hwcap", driver.hwcap())?;
            let processor_id = create_processor_id(
                identifier.stepping(),
                identifier.model(),
                identifier.family(),
                &flags,
                hwcap,
            );
            debug!(%processor_id, hwcap, "built processor ID from identification fields");
            identifier = identifier.with_processor_id(processor_id);
        }

        let expiration = config.memo_expiration;
        let processor = Self {
            max_freq: memoize_query(&driver, "max_freq_hz", expiration, |d| d.max_freq_hz()),
            current_freq: memoize_query(&driver, "current_freq_hz", expiration, |d| {
                d.current_freq_hz()
            }),
            context_switches: memoize_query(&driver, "context_switches", expiration, |d| {
                d.context_switches()
            }),
            interrupts: memoize_query(&driver, "interrupts", expiration, |d| d.interrupts()),
            driver,
            identifier,
            topology,
            caches,
        };

        info!(
            vendor = processor.identifier.vendor(),
            name = processor.identifier.name(),
            logical = processor.logical_processor_count(),
            physical = processor.physical_processor_count(),
            packages = processor.physical_package_count(),
            caches = processor.caches.len(),
            "CPU topology initialized"
        );

        Ok(processor)
    }

    pub fn processor_identifier(&self) -> &ProcessorIdentifier {
        &self.identifier
    }

    /// Logical processors in the order the driver reported them.
    pub fn logical_processors(&self) -> &[LogicalProcessor] {
        &self.topology.logical_processors
    }

    /// Physical cores, as supplied by the driver or derived from the logical
    /// processors.
    pub fn physical_processors(&self) -> &[PhysicalProcessor] {
        &self.topology.physical_processors
    }

    /// Caches ordered from the outermost level inwards.
    pub fn processor_caches(&self) -> &[ProcessorCache] {
        &self.caches
    }

    pub fn logical_processor_count(&self) -> usize {
        self.topology.logical_processor_count()
    }

    pub fn physical_processor_count(&self) -> usize {
        self.topology.physical_processor_count()
    }

    pub fn physical_package_count(&self) -> usize {
        self.topology.physical_package_count
    }

    /// Maximum frequency in Hz, -1 if unknown.
    pub fn max_freq(&self) -> Result<i64> {
        self.max_freq.get().map(|v| *v)
    }

    /// Current frequency per logical processor in Hz.
    pub fn current_freq(&self) -> Result<Arc<Vec<i64>>> {
        self.current_freq.get()
    }

    pub fn context_switches(&self) -> Result<u64> {
        self.context_switches.get().map(|v| *v)
    }

    pub fn interrupts(&self) -> Result<u64> {
        self.interrupts.get().map(|v| *v)
    }

    /// Fresh system-wide tick snapshot from the driver.
    pub fn system_cpu_load_ticks(&self) -> Result<TickSnapshot> {
        query("system_ticks", self.driver.system_ticks())
    }

    /// Fresh per-logical-processor tick snapshots from the driver.
    pub fn processor_cpu_load_ticks(&self) -> Result<Vec<TickSnapshot>> {
        query("per_core_ticks", self.driver.per_core_ticks())
    }

    /// Busy fraction between two system-wide snapshots.
    pub fn system_load_between<T: AsRef<[u64]>>(&self, old: T, new: T) -> Result<f64> {
        load::system_load_between(old, new)
    }

    /// Busy fraction per logical processor between two sets of snapshots.
    ///
    /// Each set needs one 8-wide row per logical processor.
    pub fn per_core_load_between<T: AsRef<[u64]>>(&self, old: &[T], new: &[T]) -> Result<Vec<f64>> {
        load::per_core_load_between(old, new, self.logical_processor_count())
    }

    /// Sample system ticks, wait out the rest of `delay`, sample again and
    /// return the busy fraction. Blocks the calling thread.
    ///
    /// Concurrent callers each get their own window, so overlapping calls
    /// return close but not identical results.
    pub fn system_load(&self, delay: Duration) -> Result<f64> {
        let start = Instant::now();
        let old = self.system_cpu_load_ticks()?;
        sleep_remaining(start, delay);
        let new = self.system_cpu_load_ticks()?;
        self.system_load_between(old, new)
    }

    /// Per-logical-processor version of [`system_load`](Self::system_load).
    pub fn per_core_load(&self, delay: Duration) -> Result<Vec<f64>> {
        let start = Instant::now();
        let old = self.processor_cpu_load_ticks()?;
        sleep_remaining(start, delay);
        let new = self.processor_cpu_load_ticks()?;
        self.per_core_load_between(&old, &new)
    }

    /// Up to three load averages (1, 5, 15 minutes) from the driver.
    ///
    /// Negative entries mean the platform does not provide that average.
    pub fn system_load_average(&self, nelem: usize) -> Result<Vec<f64>> {
        if !(1..=MAX_LOAD_AVERAGES).contains(&nelem) {
            return Err(TopologyError::invalid_argument(format!(
                "must request between 1 and {MAX_LOAD_AVERAGES} load averages, got {nelem}"
            )));
        }
        query("system_load_average", self.driver.system_load_average(nelem))
    }
}

fn sleep_remaining(start: Instant, delay: Duration) {
    let remaining = delay.saturating_sub(start.elapsed());
    if !remaining.is_zero() {
        thread::sleep(remaining);
    }
}

impl fmt::Debug for CentralProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentralProcessor")
            .field("identifier", &self.identifier)
            .field("topology", &self.topology)
            .field("caches", &self.caches)
            .field("max_freq", &self.max_freq)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CentralProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.identifier)?;
        writeln!(f, " {} physical CPU package(s)", self.physical_package_count())?;
        writeln!(f, " {} physical CPU core(s)", self.physical_processor_count())?;
        write!(f, " {} logical CPU(s)", self.logical_processor_count())?;
        for cache in &self.caches {
            write!(f, "\n {cache}")?;
        }
        Ok(())
    }
}
