//! Deduplication and canonical ordering of processor caches.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::model::ProcessorCache;

/// Position of the highest set bit, counting from 1; 0 for an empty cache.
fn size_magnitude(cache_size: u32) -> i64 {
    i64::from(u32::BITS - cache_size.leading_zeros())
}

/// Sort key: higher levels first, then by type ordinal, then larger first.
fn order_key(cache: &ProcessorCache) -> i64 {
    -1000 * i64::from(cache.level) + 100 * cache.cache_type.ordinal()
        - size_magnitude(cache.cache_size)
}

/// Turn a set of cache descriptors into a deterministic ordered list.
///
/// Structurally equal descriptors were already collapsed by the set. Entries
/// with equal keys fall back to exact size (larger first) and then the
/// remaining fields, so the result does not depend on hash iteration order.
pub fn order_caches(caches: &HashSet<ProcessorCache>) -> Vec<ProcessorCache> {
    let mut ordered: Vec<ProcessorCache> = caches.iter().copied().collect();
    ordered.sort_by_key(|c| {
        (
            order_key(c),
            Reverse(c.cache_size),
            c.associativity,
            c.line_size,
        )
    });
    ordered
}
