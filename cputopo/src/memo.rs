//! Lazily computed values with optional expiration.
//!
//! A [`Memoized`] wraps an accessor and caches its result, either forever or
//! for a fixed window measured on the monotonic clock. Concurrent callers may
//! each run the accessor while the cache is empty or stale, so the accessor
//! must be idempotent. The cached value is published by swapping an `Arc`
//! under a short write lock; the lock is never held while the accessor runs.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::Result;

type ComputeFn<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

struct Cached<T> {
    value: Arc<T>,
    computed_at: Instant,
}

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            computed_at: self.computed_at,
        }
    }
}

/// A value computed on first use and cached afterwards.
pub struct Memoized<T> {
    compute: ComputeFn<T>,
    /// `None` caches forever.
    expiration: Option<Duration>,
    slot: RwLock<Option<Cached<T>>>,
}

impl<T> Memoized<T> {
    /// Cache the result of `compute` for the lifetime of this handle.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self::with_expiration(compute, None)
    }

    /// Cache the result of `compute`, recomputing once `expiration` has
    /// elapsed since the last successful computation.
    ///
    /// A zero expiration recomputes on every call.
    pub fn with_expiration<F>(compute: F, expiration: Option<Duration>) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            compute: Box::new(compute),
            expiration,
            slot: RwLock::new(None),
        }
    }

    /// Return the cached value, computing it first if absent or expired.
    ///
    /// Errors from the accessor are returned as-is and nothing is cached, so
    /// the next call retries.
    pub fn get(&self) -> Result<Arc<T>> {
        if let Some(cached) = self.snapshot()
            && self.is_fresh(&cached)
        {
            return Ok(cached.value);
        }

        let value = Arc::new((self.compute)()?);
        let cached = Cached {
            value: Arc::clone(&value),
            computed_at: Instant::now(),
        };
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(cached);
        trace!(expiration = ?self.expiration, "memoized value refreshed");

        Ok(value)
    }

    /// Drop the cached value so the next [`get`](Self::get) recomputes.
    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Configured expiration window.
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    fn snapshot(&self) -> Option<Cached<T>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_fresh(&self, cached: &Cached<T>) -> bool {
        match self.expiration {
            None => true,
            Some(ttl) => cached.computed_at.elapsed() < ttl,
        }
    }
}

impl<T> fmt::Debug for Memoized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let populated = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("Memoized")
            .field("expiration", &self.expiration)
            .field("populated", &populated)
            .finish_non_exhaustive()
    }
}
