use std::collections::{HashMap, HashSet};
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

use cputopo::{
    CacheType, CpuDriver, DriverResult, LogicalProcessor, PhysicalProcessor, ProcessorCache,
    ProcessorIdentifier, TickSnapshot,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .with(filter)
            .init();
    });
}

/// In-memory driver. Every tick query advances the counters by `step`, so
/// consecutive samples always see the same deltas.
pub struct FakeDriver {
    pub logical: Vec<LogicalProcessor>,
    pub physical: Option<Vec<PhysicalProcessor>>,
    pub id_strings: Option<HashMap<u32, String>>,
    pub caches: Option<HashSet<ProcessorCache>>,
    pub identifier: ProcessorIdentifier,
    pub step: TickSnapshot,
    pub tick_calls: AtomicU64,
    pub counter_calls: AtomicU64,
    pub fail_ticks: bool,
}

#[allow(dead_code)]
impl FakeDriver {
    pub fn new(logical: Vec<LogicalProcessor>) -> Self {
        Self {
            logical,
            physical: None,
            id_strings: None,
            caches: None,
            identifier: ProcessorIdentifier::new(
                "AuthenticAMD",
                "AMD Ryzen 9 7950X 16-Core Processor",
                "25",
                "97",
                "2",
                "178BFBFF00A60F12",
                true,
            ),
            step: TickSnapshot::new([60, 0, 15, 20, 5, 0, 0, 0]),
            tick_calls: AtomicU64::new(0),
            counter_calls: AtomicU64::new(0),
            fail_ticks: false,
        }
    }

    /// `packages` x `cores` x `threads` host with SMT siblings numbered
    /// after all primary threads, the way Linux enumerates them.
    pub fn smt_host(packages: u32, cores: u32, threads: u32) -> Self {
        let per_thread = packages * cores;
        let mut logical = Vec::new();
        for thread in 0..threads {
            for package in 0..packages {
                for core in 0..cores {
                    let number = thread * per_thread + package * cores + core;
                    logical.push(LogicalProcessor::with_numa(number, core, package, package, 0));
                }
            }
        }
        Self::new(logical)
    }

    pub fn with_caches(mut self) -> Self {
        let mut caches = HashSet::new();
        // One descriptor per core, as sysfs reports them.
        for _ in &self.logical {
            caches.insert(ProcessorCache::new(1, 8, 64, 32 * 1024, CacheType::Data));
            caches.insert(ProcessorCache::new(1, 8, 64, 32 * 1024, CacheType::Instruction));
            caches.insert(ProcessorCache::new(2, 8, 64, 1024 * 1024, CacheType::Unified));
        }
        caches.insert(ProcessorCache::new(3, 16, 64, 32 * 1024 * 1024, CacheType::Unified));
        self.caches = Some(caches);
        self
    }

    fn ticks_at(&self, call: u64) -> TickSnapshot {
        let mut ticks = [0u64; 8];
        for (i, tick) in ticks.iter_mut().enumerate() {
            *tick = 1_000 + call * self.step.0[i];
        }
        TickSnapshot::new(ticks)
    }
}

impl CpuDriver for FakeDriver {
    fn logical_processors(&self) -> DriverResult<Vec<LogicalProcessor>> {
        Ok(self.logical.clone())
    }

    fn physical_processors(&self) -> DriverResult<Option<Vec<PhysicalProcessor>>> {
        Ok(self.physical.clone())
    }

    fn processor_id_strings(&self) -> DriverResult<Option<HashMap<u32, String>>> {
        Ok(self.id_strings.clone())
    }

    fn processor_caches(&self) -> DriverResult<Option<HashSet<ProcessorCache>>> {
        Ok(self.caches.clone())
    }

    fn processor_identifier(&self) -> DriverResult<ProcessorIdentifier> {
        Ok(self.identifier.clone())
    }

    fn system_ticks(&self) -> DriverResult<TickSnapshot> {
        if self.fail_ticks {
            anyhow::bail!("perfstat_cpu_total returned -1");
        }
        let call = self.tick_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ticks_at(call))
    }

    fn per_core_ticks(&self) -> DriverResult<Vec<TickSnapshot>> {
        if self.fail_ticks {
            anyhow::bail!("perfstat_cpu returned -1");
        }
        let call = self.tick_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.ticks_at(call); self.logical.len()])
    }

    fn max_freq_hz(&self) -> DriverResult<i64> {
        Ok(5_700_000_000)
    }

    fn current_freq_hz(&self) -> DriverResult<Vec<i64>> {
        let call = self.counter_calls.fetch_add(1, Ordering::SeqCst) as i64;
        Ok(vec![4_500_000_000 + call; self.logical.len()])
    }

    fn context_switches(&self) -> DriverResult<u64> {
        Ok(1_000 + self.counter_calls.fetch_add(1, Ordering::SeqCst))
    }

    fn interrupts(&self) -> DriverResult<u64> {
        Ok(7)
    }

    fn system_load_average(&self, nelem: usize) -> DriverResult<Vec<f64>> {
        Ok([0.45, 0.52, 0.48][..nelem].to_vec())
    }
}
