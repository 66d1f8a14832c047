//! Static family/model/stepping to microarchitecture table.

/// Returned when no table entry matches.
pub const UNKNOWN_MICROARCHITECTURE: &str = "unknown";

struct Entry {
    vendor: Vendor,
    family: u32,
    model: u32,
    /// `None` matches every stepping of the model.
    stepping: Option<u32>,
    name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vendor {
    Intel,
    Amd,
    Arm,
}

const fn any(vendor: Vendor, family: u32, model: u32, name: &'static str) -> Entry {
    Entry {
        vendor,
        family,
        model,
        stepping: None,
        name,
    }
}

const fn at(vendor: Vendor, family: u32, model: u32, stepping: u32, name: &'static str) -> Entry {
    Entry {
        vendor,
        family,
        model,
        stepping: Some(stepping),
        name,
    }
}

// Stepping-specific rows must precede the model-wide row they refine.
static TABLE: &[Entry] = &[
    // Intel family 6
    any(Vendor::Intel, 6, 15, "Core"),
    any(Vendor::Intel, 6, 23, "Penryn"),
    any(Vendor::Intel, 6, 26, "Nehalem"),
    any(Vendor::Intel, 6, 30, "Nehalem"),
    any(Vendor::Intel, 6, 37, "Westmere"),
    any(Vendor::Intel, 6, 44, "Westmere"),
    any(Vendor::Intel, 6, 42, "Sandy Bridge"),
    any(Vendor::Intel, 6, 45, "Sandy Bridge"),
    any(Vendor::Intel, 6, 58, "Ivy Bridge"),
    any(Vendor::Intel, 6, 62, "Ivy Bridge"),
    any(Vendor::Intel, 6, 60, "Haswell"),
    any(Vendor::Intel, 6, 63, "Haswell"),
    any(Vendor::Intel, 6, 69, "Haswell"),
    any(Vendor::Intel, 6, 70, "Haswell"),
    any(Vendor::Intel, 6, 61, "Broadwell"),
    any(Vendor::Intel, 6, 71, "Broadwell"),
    any(Vendor::Intel, 6, 79, "Broadwell"),
    any(Vendor::Intel, 6, 78, "Skylake"),
    any(Vendor::Intel, 6, 94, "Skylake"),
    at(Vendor::Intel, 6, 85, 7, "Cascade Lake"),
    at(Vendor::Intel, 6, 85, 11, "Cooper Lake"),
    any(Vendor::Intel, 6, 85, "Skylake"),
    at(Vendor::Intel, 6, 142, 9, "Kaby Lake"),
    at(Vendor::Intel, 6, 142, 12, "Comet Lake"),
    any(Vendor::Intel, 6, 142, "Coffee Lake"),
    at(Vendor::Intel, 6, 158, 9, "Kaby Lake"),
    any(Vendor::Intel, 6, 158, "Coffee Lake"),
    any(Vendor::Intel, 6, 165, "Comet Lake"),
    any(Vendor::Intel, 6, 126, "Ice Lake"),
    any(Vendor::Intel, 6, 106, "Ice Lake"),
    any(Vendor::Intel, 6, 140, "Tiger Lake"),
    any(Vendor::Intel, 6, 141, "Tiger Lake"),
    any(Vendor::Intel, 6, 167, "Rocket Lake"),
    any(Vendor::Intel, 6, 151, "Alder Lake"),
    any(Vendor::Intel, 6, 154, "Alder Lake"),
    any(Vendor::Intel, 6, 183, "Raptor Lake"),
    any(Vendor::Intel, 6, 191, "Raptor Lake"),
    any(Vendor::Intel, 6, 143, "Sapphire Rapids"),
    any(Vendor::Intel, 6, 170, "Meteor Lake"),
    any(Vendor::Intel, 6, 198, "Arrow Lake"),
    // AMD
    any(Vendor::Amd, 21, 1, "Bulldozer"),
    any(Vendor::Amd, 21, 2, "Piledriver"),
    any(Vendor::Amd, 21, 48, "Steamroller"),
    any(Vendor::Amd, 21, 96, "Excavator"),
    any(Vendor::Amd, 23, 1, "Zen"),
    any(Vendor::Amd, 23, 17, "Zen"),
    any(Vendor::Amd, 23, 8, "Zen+"),
    any(Vendor::Amd, 23, 24, "Zen+"),
    any(Vendor::Amd, 23, 49, "Zen 2"),
    any(Vendor::Amd, 23, 96, "Zen 2"),
    any(Vendor::Amd, 23, 113, "Zen 2"),
    any(Vendor::Amd, 25, 1, "Zen 3"),
    any(Vendor::Amd, 25, 33, "Zen 3"),
    any(Vendor::Amd, 25, 80, "Zen 3"),
    any(Vendor::Amd, 25, 68, "Zen 3+"),
    any(Vendor::Amd, 25, 17, "Zen 4"),
    any(Vendor::Amd, 25, 97, "Zen 4"),
    any(Vendor::Amd, 25, 116, "Zen 4"),
    any(Vendor::Amd, 25, 117, "Zen 4"),
    any(Vendor::Amd, 25, 160, "Zen 4c"),
    any(Vendor::Amd, 26, 2, "Zen 5"),
    any(Vendor::Amd, 26, 68, "Zen 5"),
    // ARM: family is the architecture, model the MIDR part number.
    any(Vendor::Arm, 8, 0xd03, "Cortex-A53"),
    any(Vendor::Arm, 8, 0xd05, "Cortex-A55"),
    any(Vendor::Arm, 8, 0xd07, "Cortex-A57"),
    any(Vendor::Arm, 8, 0xd08, "Cortex-A72"),
    any(Vendor::Arm, 8, 0xd0b, "Cortex-A76"),
    any(Vendor::Arm, 8, 0xd0c, "Neoverse-N1"),
    any(Vendor::Arm, 8, 0xd41, "Cortex-A78"),
    any(Vendor::Arm, 8, 0xd44, "Cortex-X1"),
    any(Vendor::Arm, 8, 0xd40, "Neoverse-V1"),
    any(Vendor::Arm, 8, 0xd49, "Neoverse-N2"),
];

fn vendor_of(vendor: &str) -> Option<Vendor> {
    match vendor.trim() {
        "GenuineIntel" | "Intel" => Some(Vendor::Intel),
        "AuthenticAMD" | "AMD" => Some(Vendor::Amd),
        "ARM" | "ARM Limited" | "0x41" => Some(Vendor::Arm),
        _ => None,
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal numeral.
fn parse_numeral(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Look up the microarchitecture name for a processor.
///
/// Returns [`UNKNOWN_MICROARCHITECTURE`] when the vendor or numerals are not
/// recognised. A stepping-specific entry wins over a model-wide one.
pub fn lookup_microarchitecture(
    vendor: &str,
    family: &str,
    model: &str,
    stepping: &str,
) -> &'static str {
    let (Some(vendor), Some(family), Some(model)) =
        (vendor_of(vendor), parse_numeral(family), parse_numeral(model))
    else {
        return UNKNOWN_MICROARCHITECTURE;
    };
    let stepping = parse_numeral(stepping);

    TABLE
        .iter()
        .filter(|e| e.vendor == vendor && e.family == family && e.model == model)
        .find(|e| e.stepping.is_none() || e.stepping == stepping)
        .map_or(UNKNOWN_MICROARCHITECTURE, |e| e.name)
}
