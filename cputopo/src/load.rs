//! CPU load from pairs of cumulative tick snapshots.
//!
//! Load is the share of elapsed ticks not spent idle or waiting on I/O:
//! `(total - idle - iowait) / total` over the per-category differences.

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::model::TickType;

fn check_width(ticks: &[u64], label: &str) -> Result<()> {
    if ticks.len() != TickType::COUNT {
        return Err(TopologyError::invalid_argument(format!(
            "{label} tick array has {} entries, expected {}",
            ticks.len(),
            TickType::COUNT
        )));
    }
    Ok(())
}

/// Per-category difference, with counters that went backwards treated as 0.
fn delta(old: &[u64], new: &[u64], tick: TickType) -> u64 {
    let i = tick.index();
    if new[i] < old[i] {
        debug!(
            category = ?tick,
            old = old[i],
            new = new[i],
            "tick counter went backwards, clamping delta to 0"
        );
    }
    new[i].saturating_sub(old[i])
}

fn load_from_rows(old: &[u64], new: &[u64]) -> f64 {
    let deltas = TickType::ALL.map(|tick| delta(old, new, tick));
    let total = deltas.iter().fold(0u64, |acc, d| acc.saturating_add(*d));
    if total == 0 {
        return 0.0;
    }
    let idle = deltas[TickType::Idle.index()].saturating_add(deltas[TickType::IoWait.index()]);
    total.saturating_sub(idle) as f64 / total as f64
}

/// Fraction of time the whole system was busy between two snapshots.
///
/// Returns a value in `0.0..=1.0`, exactly `0.0` when no ticks elapsed.
/// Fails when either snapshot is not 8 counters wide.
pub fn system_load_between<T: AsRef<[u64]>>(old: T, new: T) -> Result<f64> {
    let (old, new) = (old.as_ref(), new.as_ref());
    check_width(old, "previous")?;
    check_width(new, "current")?;
    Ok(load_from_rows(old, new))
}

/// Busy fraction per logical processor between two sets of snapshots.
///
/// Both sets must have `processor_count` rows, each 8 counters wide.
pub fn per_core_load_between<T: AsRef<[u64]>>(
    old: &[T],
    new: &[T],
    processor_count: usize,
) -> Result<Vec<f64>> {
    if old.len() != processor_count || new.len() != processor_count {
        return Err(TopologyError::invalid_argument(format!(
            "tick arrays have {} and {} rows, expected {processor_count} logical processors",
            old.len(),
            new.len()
        )));
    }

    old.iter()
        .zip(new)
        .enumerate()
        .map(|(row, (old, new))| {
            let (old, new) = (old.as_ref(), new.as_ref());
            check_width(old, &format!("previous row {row}"))?;
            check_width(new, &format!("current row {row}"))?;
            Ok(load_from_rows(old, new))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TickSnapshot;
    use proptest::prelude::*;

    fn with(tick: TickType, value: u64) -> TickSnapshot {
        let mut snapshot = TickSnapshot::default();
        snapshot.set(tick, value);
        snapshot
    }

    #[test]
    fn test_user_only_is_full_load() {
        let old = TickSnapshot::default();
        let new = with(TickType::User, 100);
        assert_eq!(system_load_between(old, new).expect("valid width"), 1.0);
    }

    #[test]
    fn test_idle_only_is_zero_load() {
        let old = TickSnapshot::default();
        let new = with(TickType::Idle, 100);
        assert_eq!(system_load_between(old, new).expect("valid width"), 0.0);
    }

    #[test]
    fn test_iowait_counts_as_idle() {
        let old = TickSnapshot::new([100, 0, 50, 800, 50, 0, 0, 0]);
        let new = TickSnapshot::new([200, 0, 100, 850, 100, 0, 0, 0]);
        // total delta 250, idle+iowait delta 100
        let load = system_load_between(old, new).expect("valid width");
        assert!((load - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_no_elapsed_ticks_is_zero_not_nan() {
        let ticks = TickSnapshot::new([5, 6, 7, 8, 9, 10, 11, 12]);
        let load = system_load_between(ticks, ticks).expect("valid width");
        assert_eq!(load, 0.0);
    }

    #[test]
    fn test_backwards_counters_clamp_to_zero() {
        let old = TickSnapshot::new([1000, 0, 0, 5000, 0, 0, 0, 0]);
        let new = TickSnapshot::new([100, 0, 0, 5100, 0, 0, 0, 0]);
        // user went backwards and contributes nothing
        assert_eq!(system_load_between(old, new).expect("valid width"), 0.0);

        let new = TickSnapshot::new([1100, 0, 0, 500, 0, 0, 0, 0]);
        // idle went backwards: only user advanced
        assert_eq!(system_load_between(old, new).expect("valid width"), 1.0);
    }

    #[test]
    fn test_wrong_width_is_invalid_argument() {
        let short = vec![1u64; 7];
        let ok = vec![1u64; 8];
        let err = system_load_between(short.as_slice(), ok.as_slice()).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidArgument { .. }));

        let long = vec![1u64; 10];
        assert!(system_load_between(ok.as_slice(), long.as_slice()).is_err());
    }

    #[test]
    fn test_per_core_rows() {
        let old = vec![TickSnapshot::default(), TickSnapshot::default()];
        let new = vec![with(TickType::System, 10), with(TickType::Idle, 10)];

        let loads = per_core_load_between(&old, &new, 2).expect("shapes match");

        assert_eq!(loads, vec![1.0, 0.0]);
    }

    #[test]
    fn test_per_core_row_count_mismatch() {
        let old = vec![TickSnapshot::default(); 3];
        let new = vec![TickSnapshot::default(); 3];
        let err = per_core_load_between(&old, &new, 4).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidArgument { .. }));

        let fewer = vec![TickSnapshot::default(); 2];
        assert!(per_core_load_between(&old, &fewer, 3).is_err());
    }

    #[test]
    fn test_per_core_row_width_mismatch() {
        let old = vec![vec![0u64; 8], vec![0u64; 8]];
        let new = vec![vec![1u64; 8], vec![1u64; 6]];
        let err = per_core_load_between(&old, &new, 2).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    fn arb_pair() -> impl Strategy<Value = (TickSnapshot, TickSnapshot)> {
        (
            prop::array::uniform8(0u64..(1 << 40)),
            prop::array::uniform8(0u64..(1 << 40)),
        )
            .prop_map(|(base, step)| {
                let new = std::array::from_fn(|i| base[i] + step[i]);
                (TickSnapshot::new(base), TickSnapshot::new(new))
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn test_load_stays_in_unit_interval((old, new) in arb_pair()) {
            let load = system_load_between(old, new).expect("valid width");
            prop_assert!((0.0..=1.0).contains(&load), "load {load} out of range");
        }

        #[test]
        fn test_arbitrary_counters_never_nan(
            old in prop::array::uniform8(any::<u64>()),
            new in prop::array::uniform8(any::<u64>()),
        ) {
            let load = system_load_between(old.as_slice(), new.as_slice()).expect("valid width");
            prop_assert!(load.is_finite());
            prop_assert!((0.0..=1.0).contains(&load));
        }
    }
}
