//! Object pool for transient entities
//!
//! Instances are moved out on `acquire` and moved back in on `release`, so
//! the pool holds the free list and nothing else. Reuse goes through
//! [`Poolable::reset`], which must overwrite every field.

use serde::Serialize;

/// Types that can live in an [`ObjectPool`]
pub trait Poolable {
    /// Arguments a fresh or recycled instance is initialized from
    type Args;

    /// Build a new instance
    fn create(args: Self::Args) -> Self;

    /// Re-initialize a recycled instance (full field reset)
    fn reset(&mut self, args: Self::Args);
}

/// Pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PoolStats {
    /// Instances constructed from scratch
    pub created: u64,
    /// Instances handed out from the free list
    pub reused: u64,
    /// Instances accepted back into the free list
    pub released: u64,
    /// Instances dropped because the free list was full
    pub dropped: u64,
    /// Current free list length
    pub available: usize,
    /// Free list capacity
    pub max_size: usize,
}

impl PoolStats {
    /// Fraction of acquisitions served from the free list
    pub fn reuse_ratio(&self) -> f32 {
        let total = self.created + self.reused;
        if total == 0 {
            0.0
        } else {
            self.reused as f32 / total as f32
        }
    }
}

/// Reusable-instance allocator
#[derive(Debug)]
pub struct ObjectPool<T: Poolable> {
    free: Vec<T>,
    max_size: usize,
    created: u64,
    reused: u64,
    released: u64,
    dropped: u64,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_size),
            max_size,
            created: 0,
            reused: 0,
            released: 0,
            dropped: 0,
        }
    }

    /// Take an instance, recycling one if available
    pub fn acquire(&mut self, args: T::Args) -> T {
        match self.free.pop() {
            Some(mut item) => {
                item.reset(args);
                self.reused += 1;
                item
            }
            None => {
                self.created += 1;
                T::create(args)
            }
        }
    }

    /// Return an instance; dropped if the free list is full
    pub fn release(&mut self, item: T) {
        if self.free.len() < self.max_size {
            self.free.push(item);
            self.released += 1;
        } else {
            self.dropped += 1;
        }
    }

    /// Return many instances at once
    pub fn release_all(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.release(item);
        }
    }

    /// Change the capacity, trimming the free list if it shrank
    pub fn resize(&mut self, max_size: usize) {
        self.max_size = max_size;
        if self.free.len() > max_size {
            let excess = self.free.len() - max_size;
            self.free.truncate(max_size);
            self.dropped += excess as u64;
            log::debug!("Pool resized to {}, trimmed {} instances", max_size, excess);
        }
    }

    /// Free instances currently held
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn reuse_ratio(&self) -> f32 {
        self.stats().reuse_ratio()
    }

    /// Healthy means most acquisitions are recycled
    pub fn is_healthy(&self) -> bool {
        self.reuse_ratio() > 0.5
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created,
            reused: self.reused,
            released: self.released,
            dropped: self.dropped,
            available: self.free.len(),
            max_size: self.max_size,
        }
    }

    /// Drop all free instances (counters are kept)
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Dummy {
        id: u32,
        value: i32,
        resets: u32,
    }

    impl Poolable for Dummy {
        type Args = (u32, i32);

        fn create((id, value): Self::Args) -> Self {
            Self {
                id,
                value,
                resets: 0,
            }
        }

        fn reset(&mut self, (id, value): Self::Args) {
            self.id = id;
            self.value = value;
            self.resets += 1;
        }
    }

    #[test]
    fn test_acquire_creates_then_reuses() {
        let mut pool: ObjectPool<Dummy> = ObjectPool::new(4);
        let a = pool.acquire((1, 10));
        assert_eq!(pool.stats().created, 1);
        assert_eq!(a.resets, 0);

        pool.release(a);
        let b = pool.acquire((2, 20));
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.value, 20);
        assert_eq!(b.resets, 1);
    }

    #[test]
    fn test_release_caps_at_max_size() {
        let mut pool: ObjectPool<Dummy> = ObjectPool::new(5);
        let items: Vec<_> = (0..6).map(|i| pool.acquire((i, 0))).collect();
        assert_eq!(pool.stats().created, 6);

        pool.release_all(items);
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.stats().dropped, 1);
        // The sixth release was the one dropped
        assert!(pool.free.iter().all(|d| d.id < 5));
    }

    #[test]
    fn test_health_threshold() {
        let mut pool: ObjectPool<Dummy> = ObjectPool::new(2);
        let a = pool.acquire((0, 0));
        assert!(!pool.is_healthy());
        pool.release(a);
        for i in 0..3 {
            let item = pool.acquire((i, 0));
            pool.release(item);
        }
        // 1 created, 3 reused
        assert!((pool.reuse_ratio() - 0.75).abs() < 1e-6);
        assert!(pool.is_healthy());
    }

    #[test]
    fn test_resize_trims_free_list() {
        let mut pool: ObjectPool<Dummy> = ObjectPool::new(8);
        let items: Vec<_> = (0..8).map(|i| pool.acquire((i, 0))).collect();
        pool.release_all(items);
        assert_eq!(pool.len(), 8);

        pool.resize(3);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.max_size(), 3);
    }

    proptest! {
        #[test]
        fn prop_round_trip_never_lowers_reuse(max in 1usize..16, rounds in 1usize..64) {
            let mut pool: ObjectPool<Dummy> = ObjectPool::new(max);
            let mut last_ratio = pool.reuse_ratio();
            for i in 0..rounds {
                let item = pool.acquire((i as u32, 0));
                pool.release(item);
                let ratio = pool.reuse_ratio();
                prop_assert!(ratio >= last_ratio);
                prop_assert!(pool.len() <= max);
                last_ratio = ratio;
            }
        }
    }
}
