//! Reconstruction of an x86-style processor ID from textual fields.
//!
//! Platforms without a native CPUID signature still report family, model,
//! stepping and a feature flag list. Packing those into the layout of
//! CPUID leaf 1 (EAX in the low half, EDX feature bits in the high half)
//! gives a stable 64-bit signature comparable across drivers.

/// Feature flag names and their CPUID leaf 1 EDX bit, offset into the high
/// half. Bits 42 and 52 are reserved in EDX and have no flag.
const FEATURE_BITS: [(&str, u32); 30] = [
    ("fpu", 32),
    ("vme", 33),
    ("de", 34),
    ("pse", 35),
    ("tsc", 36),
    ("msr", 37),
    ("pae", 38),
    ("mce", 39),
    ("cx8", 40),
    ("apic", 41),
    ("sep", 43),
    ("mtrr", 44),
    ("pge", 45),
    ("mca", 46),
    ("cmov", 47),
    ("pat", 48),
    ("pse-36", 49),
    ("psn", 50),
    ("clfsh", 51),
    ("ds", 53),
    ("acpi", 54),
    ("mmx", 55),
    ("fxsr", 56),
    ("sse", 57),
    ("sse2", 58),
    ("ss", 59),
    ("htt", 60),
    ("tm", 61),
    ("ia64", 62),
    ("pbe", 63),
];

fn parse_or_zero(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

fn feature_bit(flag: &str) -> Option<u32> {
    FEATURE_BITS
        .iter()
        .find(|(name, _)| *name == flag)
        .map(|(_, bit)| *bit)
}

/// Build a 16 hex digit processor ID.
///
/// `stepping`, `model` and `family` are decimal numerals; anything that does
/// not parse counts as 0. When `hwcap` is non-zero it becomes the upper 32
/// bits verbatim; otherwise each recognised entry of `flags` sets its EDX
/// bit. Unknown flags are ignored.
pub fn create_processor_id<S: AsRef<str>>(
    stepping: &str,
    model: &str,
    family: &str,
    flags: &[S],
    hwcap: u64,
) -> String {
    let stepping = parse_or_zero(stepping);
    let model = parse_or_zero(model);
    let family = parse_or_zero(family);

    // 3:0 stepping
    let mut id = stepping & 0xF;
    // 7:4 model, 19:16 extended model
    id |= (model & 0x0F) << 4;
    id |= (model & 0xF0) << 12;
    // 11:8 family, 23:20 extended family
    id |= (family & 0x0F) << 8;
    id |= (family & 0xF0) << 16;

    if hwcap != 0 {
        id |= (hwcap & 0xFFFF_FFFF) << 32;
    } else {
        for bit in flags.iter().filter_map(|f| feature_bit(f.as_ref())) {
            id |= 1u64 << bit;
        }
    }

    format!("{id:016X}")
}
