//! Processor identification strings and derived fields.

use std::fmt;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::microarch::lookup_microarchitecture;

/// Matches the `@ 3.20GHz` suffix many vendors put in the model name.
static HERTZ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@\s*([0-9]+(?:\.[0-9]+)?)\s*([kMGT]?)Hz").expect("Invalid frequency regex")
});

/// Vendor, family, model and stepping of the host's processors.
///
/// The microarchitecture name is looked up on first access and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorIdentifier {
    vendor: String,
    name: String,
    family: String,
    model: String,
    stepping: String,
    processor_id: String,
    is_64bit: bool,
    vendor_freq_hz: i64,
    #[serde(skip)]
    microarchitecture: OnceLock<String>,
}

impl Default for ProcessorIdentifier {
    fn default() -> Self {
        Self::new("", "", "", "", "", "", false)
    }
}

impl ProcessorIdentifier {
    /// Build an identifier. The vendor frequency is parsed from an
    /// `@ <n>GHz` marker in `name` when present, otherwise it is -1.
    pub fn new(
        vendor: impl Into<String>,
        name: impl Into<String>,
        family: impl Into<String>,
        model: impl Into<String>,
        stepping: impl Into<String>,
        processor_id: impl Into<String>,
        is_64bit: bool,
    ) -> Self {
        let name = name.into();
        let vendor_freq_hz = parse_vendor_freq(&name).unwrap_or(-1);
        Self {
            vendor: vendor.into(),
            name,
            family: family.into(),
            model: model.into(),
            stepping: stepping.into(),
            processor_id: processor_id.into(),
            is_64bit,
            vendor_freq_hz,
            microarchitecture: OnceLock::new(),
        }
    }

    /// Override the vendor frequency. Negative values keep the one parsed
    /// from the name.
    pub fn with_vendor_freq(mut self, vendor_freq_hz: i64) -> Self {
        if vendor_freq_hz >= 0 {
            self.vendor_freq_hz = vendor_freq_hz;
        }
        self
    }

    /// Replace the processor ID, e.g. with one built by
    /// [`crate::procid::create_processor_id`].
    pub fn with_processor_id(mut self, processor_id: impl Into<String>) -> Self {
        self.processor_id = processor_id.into();
        self
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn stepping(&self) -> &str {
        &self.stepping
    }

    pub fn processor_id(&self) -> &str {
        &self.processor_id
    }

    pub fn is_64bit(&self) -> bool {
        self.is_64bit
    }

    /// Advertised frequency in Hz, -1 if unknown.
    pub fn vendor_freq_hz(&self) -> i64 {
        self.vendor_freq_hz
    }

    /// Microarchitecture name, or `"unknown"`.
    pub fn microarchitecture(&self) -> &str {
        self.microarchitecture.get_or_init(|| {
            lookup_microarchitecture(&self.vendor, &self.family, &self.model, &self.stepping)
                .to_string()
        })
    }

    /// Identifier in the `Intel64 Family 6 Model 158 Stepping 10` form.
    pub fn identifier(&self) -> String {
        let tag = if self.vendor == "GenuineIntel" {
            if self.is_64bit { "Intel64" } else { "x86" }
        } else {
            self.vendor.as_str()
        };
        format!(
            "{tag} Family {} Model {} Stepping {}",
            self.family, self.model, self.stepping
        )
    }
}

impl fmt::Display for ProcessorIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n {}", self.name, self.identifier())?;
        if !self.processor_id.is_empty() {
            write!(f, "\n ProcessorID: {}", self.processor_id)?;
        }
        write!(f, "\n Microarchitecture: {}", self.microarchitecture())
    }
}

/// Extract the frequency in Hz from a `@ 2.40GHz` style marker.
pub fn parse_vendor_freq(name: &str) -> Option<i64> {
    let caps = HERTZ_RE.captures(name)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = match caps.get(2).map_or("", |m| m.as_str()) {
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        _ => 1.0,
    };
    Some((value * multiplier).round() as i64)
}
