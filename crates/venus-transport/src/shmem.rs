//! Shared-memory block cache.
//!
//! Reply shmems churn at command rate, so freed blocks are kept on
//! power-of-two size buckets for reuse. Only exact power-of-two sizes are
//! cached; anything else skips the cache and is allocated fresh.

use parking_lot::Mutex;
use tracing::debug;

/// A shared-memory block. The backing store is plain heap memory here;
/// the cache only cares about its size class.
#[derive(Debug)]
pub struct Shmem {
    data: Vec<u8>,
}

impl Shmem {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[derive(Debug, Default)]
struct CacheStats {
    shmem_count: u32,
    skip_count: u32,
    hit_count: u32,
    miss_count: u32,
}

#[derive(Debug, Default)]
struct CacheState {
    buckets: Vec<Vec<Shmem>>,
    stats: CacheStats,
}

/// Power-of-two bucketed free list of shmem blocks.
pub struct ShmemCache {
    state: Mutex<CacheState>,
}

const BUCKET_COUNT: usize = 40;

impl ShmemCache {
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(BUCKET_COUNT);
        buckets.resize_with(BUCKET_COUNT, Vec::new);
        Self {
            state: Mutex::new(CacheState {
                buckets,
                stats: CacheStats::default(),
            }),
        }
    }

    fn bucket_index(size: usize) -> Option<usize> {
        if size == 0 || !size.is_power_of_two() {
            return None;
        }
        let idx = size.trailing_zeros() as usize;
        (idx < BUCKET_COUNT).then_some(idx)
    }

    /// Get a block of exactly `size` bytes, reusing a cached one when the
    /// size class has a free block.
    pub fn get(&self, size: usize) -> Shmem {
        let Some(idx) = Self::bucket_index(size) else {
            self.state.lock().stats.skip_count += 1;
            return Shmem::new(size);
        };

        let mut state = self.state.lock();
        match state.buckets[idx].pop() {
            Some(shmem) => {
                state.stats.shmem_count -= 1;
                state.stats.hit_count += 1;
                shmem
            }
            None => {
                state.stats.miss_count += 1;
                drop(state);
                Shmem::new(size)
            }
        }
    }

    /// Return a block to its size bucket. Blocks with uncacheable sizes
    /// are dropped.
    pub fn add(&self, shmem: Shmem) -> bool {
        let Some(idx) = Self::bucket_index(shmem.size()) else {
            return false;
        };
        let mut state = self.state.lock();
        state.buckets[idx].push(shmem);
        state.stats.shmem_count += 1;
        true
    }

    pub fn debug_dump(&self) {
        let state = self.state.lock();
        debug!("dumping shmem cache");
        debug!("  shmem count: {}", state.stats.shmem_count);
        debug!("  cache skip: {}", state.stats.skip_count);
        debug!("  cache hit: {}", state.stats.hit_count);
        debug!("  cache miss: {}", state.stats.miss_count);
        for (idx, bucket) in state.buckets.iter().enumerate() {
            if !bucket.is_empty() {
                debug!("  buckets[{}]: {} shmems", idx, bucket.len());
            }
        }
    }
}

impl Default for ShmemCache {
    fn default() -> Self {
        Self::new()
    }
}
