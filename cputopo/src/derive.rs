//! Physical processor derivation from logical processor data.
//!
//! Drivers that cannot enumerate physical cores directly still report a
//! `(package, core)` pair per logical processor. The functions here rebuild
//! the physical core list from those pairs and, where the platform only
//! exposes free-text model strings, classify hybrid core types.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::model::{CoreKey, LogicalProcessor, PhysicalProcessor};

/// Resolved processor topology with derived counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub logical_processors: Vec<LogicalProcessor>,
    pub physical_processors: Vec<PhysicalProcessor>,
    pub physical_package_count: usize,
}

impl Topology {
    /// Resolve the topology for one host.
    ///
    /// A physical processor list supplied by the driver is trusted verbatim.
    /// Otherwise one is derived: from text markers when `id_strings` is given,
    /// from the `(package, core)` pairs alone when not.
    pub fn resolve(
        logical_processors: Vec<LogicalProcessor>,
        physical_processors: Option<Vec<PhysicalProcessor>>,
        id_strings: Option<&HashMap<u32, String>>,
    ) -> Result<Self> {
        if logical_processors.is_empty() {
            return Err(TopologyError::Empty);
        }

        let (physical_processors, source) = match (physical_processors, id_strings) {
            (Some(physical), _) => (physical, "driver"),
            (None, Some(ids)) => (
                derive_from_text_markers(&logical_processors, ids),
                "text markers",
            ),
            (None, None) => (derive_physical_processors(&logical_processors), "core keys"),
        };

        let physical_package_count = count_packages(&logical_processors);

        debug!(
            logical = logical_processors.len(),
            physical = physical_processors.len(),
            packages = physical_package_count,
            source,
            "resolved processor topology"
        );

        Ok(Self {
            logical_processors,
            physical_processors,
            physical_package_count,
        })
    }

    pub fn logical_processor_count(&self) -> usize {
        self.logical_processors.len()
    }

    pub fn physical_processor_count(&self) -> usize {
        self.physical_processors.len()
    }
}

/// Number of distinct packages among the logical processors.
pub fn count_packages(logical_processors: &[LogicalProcessor]) -> usize {
    logical_processors
        .iter()
        .map(|lp| lp.package_number)
        .collect::<HashSet<_>>()
        .len()
}

/// One physical processor per distinct `(package, core)` pair, ordered by
/// package then core.
pub fn derive_physical_processors(
    logical_processors: &[LogicalProcessor],
) -> Vec<PhysicalProcessor> {
    logical_processors
        .iter()
        .map(LogicalProcessor::core_key)
        .collect::<BTreeSet<CoreKey>>()
        .into_iter()
        .map(|key| PhysicalProcessor::new(key.package_number(), key.core_number()))
        .collect()
}

/// Derive physical processors and their efficiency class from per-logical
/// processor model strings.
///
/// Cores appear in the order their first logical processor appears. The
/// part is hybrid when more than one distinct string is reported; on a
/// hybrid part a core gets class 1 when its string is an `ARM Cortex` part
/// whose first number is 70 or above, or an `Apple` part naming
/// `Firestorm` or `Avalanche`. Everything else is class 0. The markers only
/// cover the parts listed here and misclassify newer silicon as class 0.
pub fn derive_from_text_markers(
    logical_processors: &[LogicalProcessor],
    id_strings: &HashMap<u32, String>,
) -> Vec<PhysicalProcessor> {
    let is_hybrid = id_strings.values().collect::<HashSet<_>>().len() > 1;

    let mut seen = HashSet::new();
    let mut physical = Vec::new();
    for lp in logical_processors {
        let key = lp.core_key();
        if !seen.insert(key) {
            continue;
        }
        let id_string = id_strings
            .get(&lp.processor_number)
            .cloned()
            .unwrap_or_default();
        let efficiency_class = u32::from(is_hybrid && is_marked_core(&id_string));
        physical.push(PhysicalProcessor {
            package_number: key.package_number(),
            core_number: key.core_number(),
            efficiency_class,
            id_string,
        });
    }
    physical
}

fn is_marked_core(id_string: &str) -> bool {
    if id_string.starts_with("ARM Cortex") {
        first_integer(id_string).is_some_and(|n| n >= 70)
    } else if id_string.starts_with("Apple") {
        id_string.contains("Firestorm") || id_string.contains("Avalanche")
    } else {
        false
    }
}

/// First run of ASCII digits in `text`, if any.
fn first_integer(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
