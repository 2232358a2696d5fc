// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Snapshot types describing how the fixed memory budgets are being used.
//!
//! Nothing in this subsystem allocates after initialization, so instead of
//! global allocator counters the arena and every cache keep their own plain
//! counters and hand out copies of them through these structs. The `Gfx`
//! facade collects them for the shutdown summary.

// --- Arena ---

/// A snapshot of the arena's two bump regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total size of the backing buffer, in bytes.
    pub capacity_bytes: usize,
    /// Bytes currently held on the transient (front) side.
    pub front_bytes: usize,
    /// Bytes permanently reserved on the back side.
    pub back_bytes: usize,
    /// The high-water mark of the front side.
    pub peak_front_bytes: usize,
}

impl ArenaStats {
    /// Bytes still available between the two bump pointers.
    pub fn free_bytes(&self) -> usize {
        self.capacity_bytes - self.front_bytes - self.back_bytes
    }

    /// Fraction of the buffer in use at its busiest point (`0.0..=1.0`).
    pub fn peak_utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        (self.peak_front_bytes + self.back_bytes) as f64 / self.capacity_bytes as f64
    }
}

// --- Caches ---

/// Lookup counters for a single LRU cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an existing entry.
    pub hits: u64,
    /// Lookups that had to insert a new entry.
    pub misses: u64,
    /// Entries destroyed to make room for a new one.
    pub evictions: u64,
    /// Live entries at the time of the snapshot.
    pub live: usize,
    /// Maximum number of live entries.
    pub capacity: usize,
}

impl CacheStats {
    /// The ratio of hits to total lookups, or `0.0` if nothing was looked up yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Logs the counters at debug level under the given cache name.
    pub fn log_summary(&self, name: &str) {
        log::debug!(
            "{name}: {}/{} live, {} hits, {} misses, {} evictions ({:.1}% hit ratio)",
            self.live,
            self.capacity,
            self.hits,
            self.misses,
            self.evictions,
            self.hit_ratio() * 100.0
        );
    }
}
