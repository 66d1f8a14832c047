//! CPU topology resolution and tick-based load calculation.
//!
//! Platform drivers implement [`CpuDriver`] and report whatever partial view
//! of the processors their host offers. [`CentralProcessor`] reconciles that
//! into one model: logical and physical processors, package count, ordered
//! cache hierarchy and processor identification, plus load figures computed
//! from pairs of cumulative tick snapshots.
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cputopo::{CentralProcessor, EngineConfig};
//!
//! let (config, _warnings) = EngineConfig::from_env();
//! let cpu = CentralProcessor::new(Arc::new(MyDriver::new()), config)?;
//! println!("{} cores, load {:.1}%", cpu.physical_processor_count(),
//!     cpu.system_load(Duration::from_millis(500))? * 100.0);
//! ```

pub mod cache_order;
pub mod config;
pub mod derive;
pub mod driver;
pub mod error;
pub mod identifier;
pub mod load;
pub mod logging;
pub mod memo;
pub mod microarch;
pub mod model;
pub mod processor;
pub mod procid;

pub use config::{EngineConfig, EnvError};
pub use driver::CpuDriver;
pub use error::{DriverResult, Result, TopologyError};
pub use identifier::ProcessorIdentifier;
pub use logging::{LogConfig, init_logging};
pub use memo::Memoized;
pub use model::{
    CacheType, LogicalProcessor, PhysicalProcessor, ProcessorCache, TickSnapshot, TickType,
};
pub use processor::CentralProcessor;
