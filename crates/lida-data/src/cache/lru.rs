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

//! A fixed-capacity LRU cache with intrusive links.
//!
//! Every slot carries a small header with its hash, the next slot in its hash
//! bucket, and its neighbours in the recency list. Links are slot indices. A
//! slot is either on the free list (threaded through the bucket link) or
//! present in exactly one bucket chain and one position of the recency list.
//!
//! The bucket table, headers, keys and payloads all live in one region
//! reserved on the permanent side of an [`Arena`]. The cache itself only holds
//! the region and the list ends, so every operation that reads or writes a
//! slot takes the arena it was built in. Keys and payloads are [`Pod`] so they
//! can be viewed in place inside arena words.

use super::hash::ContentHash;
use crate::allocators::{Arena, ArenaError, ArenaPtr, BACK_ALIGN};
use bytemuck::{Pod, Zeroable};
use lida_core::memory::CacheStats;
use std::cmp::Reverse;
use std::{fmt, mem};
use thiserror::Error;

const NIL: u32 = u32::MAX;
const BUCKET_SIZE: usize = mem::size_of::<u32>();

/// Size in bytes of the per-slot bookkeeping header.
pub const NODE_HEADER_SIZE: usize = mem::size_of::<Header>();

/// Callback run on an entry's payload when the entry leaves the cache by
/// eviction or [`LruCache::destroy_all`].
pub type DestroyFn<K, V> = Box<dyn FnMut(&K, &mut V)>;

/// Errors raised while building an [`LruCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LruError {
    /// The byte budget cannot hold a single slot.
    #[error("budget of {budget} bytes for cache '{cache}' holds no slot of {stride} bytes")]
    BudgetTooSmall {
        /// Name of the cache.
        cache: &'static str,
        /// Budget in bytes.
        budget: usize,
        /// Size of one slot including its header.
        stride: usize,
    },
    /// The key or payload type has no size.
    #[error("cache '{cache}' cannot store zero-sized keys or payloads")]
    ZeroSized {
        /// Name of the cache.
        cache: &'static str,
    },
    /// The budget could not be reserved from the arena, or a key or payload
    /// type needs more alignment than arena regions provide.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Header {
    hash: u32,
    chain: u32,
    prev: u32,
    next: u32,
}

impl Header {
    const fn free(chain: u32) -> Self {
        Self {
            hash: 0,
            chain,
            prev: NIL,
            next: NIL,
        }
    }
}

const BUCKETS: usize = 0;
const HEADERS: usize = 1;
const KEYS: usize = 2;
const VALUES: usize = 3;

/// Byte spans of the four slot arrays inside the reserved region.
///
/// Arrays are placed by decreasing alignment. Each array's size is a multiple
/// of its own alignment, so every array starts aligned when the region does.
#[derive(Debug, Clone, Copy)]
struct Layout {
    capacity: usize,
    bucket_count: usize,
    spans: [(usize, usize); 4],
    order: [usize; 4],
}

impl Layout {
    fn new<K, V>(capacity: usize, bucket_count: usize) -> Result<Self, ArenaError> {
        let align = mem::align_of::<K>().max(mem::align_of::<V>());
        if align > BACK_ALIGN {
            return Err(ArenaError::Misaligned { align });
        }
        let mut parts = [
            (mem::align_of::<u32>(), bucket_count * BUCKET_SIZE, BUCKETS),
            (mem::align_of::<Header>(), capacity * NODE_HEADER_SIZE, HEADERS),
            (mem::align_of::<K>(), capacity * mem::size_of::<K>(), KEYS),
            (mem::align_of::<V>(), capacity * mem::size_of::<V>(), VALUES),
        ];
        parts.sort_unstable_by_key(|&(align, _, _)| Reverse(align));

        let mut spans = [(0, 0); 4];
        let mut order = [0; 4];
        let mut cursor = 0;
        for (position, (_, bytes, part)) in parts.into_iter().enumerate() {
            spans[part] = (cursor, cursor + bytes);
            order[position] = part;
            cursor += bytes;
        }
        Ok(Self {
            capacity,
            bucket_count,
            spans,
            order,
        })
    }

    fn split_mut<'a, K: Pod, V: Pod>(&self, bytes: &'a mut [u8]) -> Slots<'a, K, V> {
        let mut parts: [&'a mut [u8]; 4] = Default::default();
        let mut rest = bytes;
        for part in self.order {
            let (start, end) = self.spans[part];
            let taken = mem::take(&mut rest);
            let (head, tail) = taken.split_at_mut(end - start);
            parts[part] = head;
            rest = tail;
        }
        let [buckets, headers, keys, values] = parts;
        Slots {
            buckets: bytemuck::cast_slice_mut(buckets),
            headers: bytemuck::cast_slice_mut(headers),
            keys: bytemuck::cast_slice_mut(keys),
            values: bytemuck::cast_slice_mut(values),
        }
    }

    fn split<'a, K: Pod, V: Pod>(&self, bytes: &'a [u8]) -> SlotsRef<'a, K, V> {
        let [buckets, headers, keys, values] = self.spans.map(|(start, end)| &bytes[start..end]);
        SlotsRef {
            buckets: bytemuck::cast_slice(buckets),
            headers: bytemuck::cast_slice(headers),
            keys: bytemuck::cast_slice(keys),
            values: bytemuck::cast_slice(values),
        }
    }
}

struct Slots<'a, K, V> {
    buckets: &'a mut [u32],
    headers: &'a mut [Header],
    keys: &'a mut [K],
    values: &'a mut [V],
}

struct SlotsRef<'a, K, V> {
    buckets: &'a [u32],
    headers: &'a [Header],
    keys: &'a [K],
    values: &'a [V],
}

/// The result of [`LruCache::get`].
#[derive(Debug)]
pub struct Lookup<'a, V> {
    /// The payload stored for the key.
    pub value: &'a mut V,
    /// `true` if the entry was inserted by this call and its payload is still
    /// zeroed and needs populating.
    pub created: bool,
    /// Index of the slot holding the entry.
    pub slot: u32,
}

/// A fixed-capacity cache that evicts its least recently used entry.
pub struct LruCache<K, V> {
    name: &'static str,
    arena_id: u32,
    region: ArenaPtr,
    layout: Layout,
    mask: u32,
    first: u32,
    last: u32,
    free: u32,
    len: usize,
    destroy: DestroyFn<K, V>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> LruCache<K, V>
where
    K: ContentHash + Eq + Pod,
    V: Pod,
{
    /// Size in bytes of one slot including its header.
    pub const fn slot_stride() -> usize {
        NODE_HEADER_SIZE + mem::size_of::<K>() + mem::size_of::<V>()
    }

    /// The budget for which [`LruCache::new_in`] builds exactly `capacity`
    /// slots.
    pub fn budget_for(capacity: usize) -> usize {
        let stride = Self::slot_stride();
        let mut buckets = 1;
        loop {
            let budget = capacity * stride + buckets * BUCKET_SIZE;
            if bucket_count_for(budget / stride) == buckets {
                return budget;
            }
            buckets *= 2;
        }
    }

    /// Creates a cache sized from a byte budget reserved on the arena's
    /// permanent side. Every slot lives inside that reservation.
    ///
    /// With `S` the slot stride, the table holds `H` buckets where `H` is the
    /// next power of two of `budget / S / 2`, and `(budget - 4 * H) / S` slots.
    ///
    /// ## Errors
    ///
    /// - [`LruError::BudgetTooSmall`] if no slot fits in the budget.
    /// - [`LruError::ZeroSized`] if `K` or `V` has no size.
    /// - [`LruError::Arena`] if the arena cannot hold the budget.
    pub fn new_in(
        arena: &mut Arena,
        name: &'static str,
        budget: usize,
        destroy: DestroyFn<K, V>,
    ) -> Result<Self, LruError> {
        if mem::size_of::<K>() == 0 || mem::size_of::<V>() == 0 {
            return Err(LruError::ZeroSized { cache: name });
        }
        let stride = Self::slot_stride();
        let too_small = LruError::BudgetTooSmall {
            cache: name,
            budget,
            stride,
        };
        let first_guess = budget / stride;
        if first_guess == 0 {
            log::error!("{too_small}");
            return Err(too_small);
        }
        let bucket_count = bucket_count_for(first_guess);
        let capacity = budget.saturating_sub(bucket_count * BUCKET_SIZE) / stride;
        if capacity == 0 {
            log::error!("{too_small}");
            return Err(too_small);
        }
        let capacity = capacity.min(NIL as usize - 1);
        let layout = Layout::new::<K, V>(capacity, bucket_count)?;
        let region = arena.push_back(budget)?;

        let mut cache = Self {
            name,
            arena_id: arena.id(),
            region,
            layout,
            mask: (bucket_count - 1) as u32,
            first: NIL,
            last: NIL,
            free: 0,
            len: 0,
            destroy,
            hits: 0,
            misses: 0,
            evictions: 0,
        };
        let mut slots = cache.slots(arena);
        cache.reset(&mut slots);
        log::debug!(
            "Cache '{}' reserved {} bytes: {} slots, {} buckets",
            name,
            budget,
            capacity,
            bucket_count
        );
        Ok(cache)
    }

    fn slots<'a>(&self, arena: &'a mut Arena) -> Slots<'a, K, V> {
        debug_assert_eq!(
            arena.id(),
            self.arena_id,
            "cache '{}' used with another arena",
            self.name
        );
        self.layout.split_mut(arena.bytes_mut(self.region))
    }

    fn slots_ref<'a>(&self, arena: &'a Arena) -> SlotsRef<'a, K, V> {
        debug_assert_eq!(
            arena.id(),
            self.arena_id,
            "cache '{}' used with another arena",
            self.name
        );
        self.layout.split(arena.bytes(self.region))
    }

    /// Looks up `key`, inserting it if absent.
    ///
    /// A hit moves the entry to the most recently used position. A miss takes a
    /// free slot, or evicts the least recently used entry first when the cache
    /// is full, and stores `key` with a zeroed payload.
    pub fn get<'a>(&mut self, arena: &'a mut Arena, key: K) -> Lookup<'a, V> {
        let hash = key.content_hash();
        let mut slots = self.slots(arena);
        if let Some(slot) = find(slots.buckets, slots.headers, slots.keys, self.mask, hash, &key) {
            self.hits += 1;
            if self.first != slot {
                self.detach(slots.headers, slot);
                self.attach_front(slots.headers, slot);
            }
            log::trace!("Cache '{}' hit on slot {}", self.name, slot);
            let Slots { values, .. } = slots;
            return Lookup {
                value: &mut values[slot as usize],
                created: false,
                slot,
            };
        }

        self.misses += 1;
        let slot = if self.free != NIL {
            let slot = self.free;
            self.free = slots.headers[slot as usize].chain;
            slot
        } else {
            self.evict_last(&mut slots)
        };

        let bucket = (hash & self.mask) as usize;
        let index = slot as usize;
        slots.headers[index] = Header::free(slots.buckets[bucket]);
        slots.headers[index].hash = hash;
        slots.keys[index] = key;
        slots.values[index] = V::zeroed();
        slots.buckets[bucket] = slot;
        self.attach_front(slots.headers, slot);
        self.len += 1;

        let Slots { values, .. } = slots;
        Lookup {
            value: &mut values[index],
            created: true,
            slot,
        }
    }

    /// Looks up `key` without touching the recency order.
    pub fn search<'a>(&self, arena: &'a Arena, key: &K) -> Option<&'a V> {
        let slots = self.slots_ref(arena);
        let hash = key.content_hash();
        let slot = find(slots.buckets, slots.headers, slots.keys, self.mask, hash, key)?;
        Some(&slots.values[slot as usize])
    }

    /// The payload of the live entry in `slot`, without touching recency.
    pub fn value_mut<'a>(&self, arena: &'a mut Arena, slot: u32) -> Option<&'a mut V> {
        let Slots { headers, values, .. } = self.slots(arena);
        if !self.is_live(headers, slot) {
            return None;
        }
        values.get_mut(slot as usize)
    }

    /// Takes `key` out of the cache without running the destroy callback.
    pub fn remove(&mut self, arena: &mut Arena, key: &K) -> Option<(K, V)> {
        let slot = {
            let slots = self.slots_ref(arena);
            let hash = key.content_hash();
            find(slots.buckets, slots.headers, slots.keys, self.mask, hash, key)?
        };
        self.remove_slot(arena, slot)
    }

    /// Takes the entry in `slot` out of the cache without running the destroy
    /// callback. Returns `None` if the slot is free.
    pub fn remove_slot(&mut self, arena: &mut Arena, slot: u32) -> Option<(K, V)> {
        let mut slots = self.slots(arena);
        if !self.is_live(slots.headers, slot) {
            return None;
        }
        self.unlink(&mut slots, slot);
        let index = slot as usize;
        let entry = (
            mem::replace(&mut slots.keys[index], K::zeroed()),
            mem::replace(&mut slots.values[index], V::zeroed()),
        );
        slots.headers[index] = Header::free(self.free);
        self.free = slot;
        Some(entry)
    }

    /// Runs the destroy callback on every entry, most recently used first, and
    /// empties the cache.
    pub fn destroy_all(&mut self, arena: &mut Arena) {
        let mut slots = self.slots(arena);
        let mut cursor = self.first;
        let mut destroyed = 0usize;
        while cursor != NIL {
            let index = cursor as usize;
            (self.destroy)(&slots.keys[index], &mut slots.values[index]);
            cursor = slots.headers[index].next;
            destroyed += 1;
        }
        if destroyed > 0 {
            log::debug!("Cache '{}' destroyed {} entries", self.name, destroyed);
        }
        self.reset(&mut slots);
    }

    /// Entries from most to least recently used.
    pub fn iter<'a>(&self, arena: &'a Arena) -> CacheIter<'a, K, V> {
        let slots = self.slots_ref(arena);
        CacheIter {
            headers: slots.headers,
            keys: slots.keys,
            values: slots.values,
            cursor: self.first,
            remaining: self.len,
        }
    }

    /// The number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.layout.capacity
    }

    /// The name given at construction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The arena region holding every slot.
    pub fn reservation(&self) -> ArenaPtr {
        self.region
    }

    /// Hit, miss and eviction counters with current occupancy.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            live: self.len,
            capacity: self.capacity(),
        }
    }

    fn is_live(&self, headers: &[Header], slot: u32) -> bool {
        let Some(header) = headers.get(slot as usize) else {
            return false;
        };
        self.first == slot || header.prev != NIL
    }

    fn evict_last(&mut self, slots: &mut Slots<'_, K, V>) -> u32 {
        let slot = self.last;
        let index = slot as usize;
        (self.destroy)(&slots.keys[index], &mut slots.values[index]);
        self.unlink(slots, slot);
        self.evictions += 1;
        log::debug!("Cache '{}' evicted slot {}", self.name, slot);
        slot
    }

    fn unlink(&mut self, slots: &mut Slots<'_, K, V>, slot: u32) {
        unlink_bucket(slots.buckets, slots.headers, self.mask, slot);
        self.detach(slots.headers, slot);
        self.len -= 1;
    }

    fn detach(&mut self, headers: &mut [Header], slot: u32) {
        let Header { prev, next, .. } = headers[slot as usize];
        if prev != NIL {
            headers[prev as usize].next = next;
        } else {
            self.first = next;
        }
        if next != NIL {
            headers[next as usize].prev = prev;
        } else {
            self.last = prev;
        }
        let header = &mut headers[slot as usize];
        header.prev = NIL;
        header.next = NIL;
    }

    fn attach_front(&mut self, headers: &mut [Header], slot: u32) {
        let first = self.first;
        let header = &mut headers[slot as usize];
        header.prev = NIL;
        header.next = first;
        if first != NIL {
            headers[first as usize].prev = slot;
        } else {
            self.last = slot;
        }
        self.first = slot;
    }

    fn reset(&mut self, slots: &mut Slots<'_, K, V>) {
        let capacity = self.layout.capacity;
        for (i, header) in slots.headers.iter_mut().enumerate() {
            *header = Header::free(free_link(i, capacity));
        }
        slots.keys.fill(K::zeroed());
        slots.values.fill(V::zeroed());
        slots.buckets.fill(NIL);
        self.first = NIL;
        self.last = NIL;
        self.free = 0;
        self.len = 0;
    }
}

fn find<K: Eq>(
    buckets: &[u32],
    headers: &[Header],
    keys: &[K],
    mask: u32,
    hash: u32,
    key: &K,
) -> Option<u32> {
    let mut cursor = buckets[(hash & mask) as usize];
    while cursor != NIL {
        let index = cursor as usize;
        if headers[index].hash == hash && keys[index] == *key {
            return Some(cursor);
        }
        cursor = headers[index].chain;
    }
    None
}

fn unlink_bucket(buckets: &mut [u32], headers: &mut [Header], mask: u32, slot: u32) {
    let header = headers[slot as usize];
    let bucket = (header.hash & mask) as usize;
    if buckets[bucket] == slot {
        buckets[bucket] = header.chain;
        return;
    }
    let mut cursor = buckets[bucket];
    while cursor != NIL {
        let next = headers[cursor as usize].chain;
        if next == slot {
            headers[cursor as usize].chain = header.chain;
            return;
        }
        cursor = next;
    }
}

fn bucket_count_for(slots: usize) -> usize {
    (slots >> 1).max(1).next_power_of_two()
}

fn free_link(i: usize, capacity: usize) -> u32 {
    if i + 1 < capacity {
        (i + 1) as u32
    } else {
        NIL
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("len", &self.len)
            .field("capacity", &self.layout.capacity)
            .field("buckets", &self.layout.bucket_count)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("evictions", &self.evictions)
            .finish_non_exhaustive()
    }
}

/// Iterator over live entries, most recently used first.
pub struct CacheIter<'a, K, V> {
    headers: &'a [Header],
    keys: &'a [K],
    values: &'a [V],
    cursor: u32,
    remaining: usize,
}

impl<'a, K, V> Iterator for CacheIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let index = self.cursor as usize;
        self.cursor = self.headers[index].next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&self.keys[index], &self.values[index]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for CacheIter<'_, K, V> {}

impl<K, V> Clone for CacheIter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            headers: self.headers,
            keys: self.keys,
            values: self.values,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<u32>>>;

    fn recording(arena: &mut Arena, capacity: usize) -> (LruCache<u32, u32>, Log) {
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        let budget = LruCache::<u32, u32>::budget_for(capacity);
        let cache = LruCache::new_in(
            arena,
            "test",
            budget,
            Box::new(move |key: &u32, _: &mut u32| sink.borrow_mut().push(*key)),
        )
        .unwrap();
        assert_eq!(cache.capacity(), capacity);
        (cache, log)
    }

    fn keys(cache: &LruCache<u32, u32>, arena: &Arena) -> Vec<u32> {
        cache.iter(arena).map(|(k, _)| *k).collect()
    }

    #[test]
    fn repeated_get_is_idempotent() {
        let mut arena = Arena::new(1024);
        let (mut cache, _) = recording(&mut arena, 4);
        let first = cache.get(&mut arena, 7);
        assert!(first.created);
        *first.value = 70;
        let slot = first.slot;
        let second = cache.get(&mut arena, 7);
        assert!(!second.created);
        assert_eq!(second.slot, slot);
        assert_eq!(*second.value, 70);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn touched_entry_survives_eviction() {
        let mut arena = Arena::new(1024);
        let (mut cache, destroyed) = recording(&mut arena, 3);
        for key in [1, 2, 3] {
            cache.get(&mut arena, key);
        }
        cache.get(&mut arena, 1);
        cache.get(&mut arena, 4);
        assert_eq!(*destroyed.borrow(), vec![2]);
        assert!(cache.search(&arena, &1).is_some());
        assert!(cache.search(&arena, &2).is_none());
        assert_eq!(keys(&cache, &arena), vec![4, 1, 3]);
    }

    #[test]
    fn one_past_capacity_evicts_exactly_once() {
        let mut arena = Arena::new(1024);
        let (mut cache, destroyed) = recording(&mut arena, 5);
        for key in 0..6 {
            cache.get(&mut arena, key);
        }
        assert_eq!(cache.len(), 5);
        assert_eq!(*destroyed.borrow(), vec![0]);
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.stats().misses, 6);
    }

    #[test]
    fn search_keeps_recency_order() {
        let mut arena = Arena::new(1024);
        let (mut cache, _) = recording(&mut arena, 2);
        cache.get(&mut arena, 1);
        cache.get(&mut arena, 2);
        assert!(cache.search(&arena, &1).is_some());
        cache.get(&mut arena, 3);
        assert!(cache.search(&arena, &1).is_none());
    }

    #[test]
    fn destroy_all_runs_once_per_entry() {
        let mut arena = Arena::new(1024);
        let (mut cache, destroyed) = recording(&mut arena, 8);
        for key in [5, 6, 7] {
            cache.get(&mut arena, key);
        }
        cache.destroy_all(&mut arena);
        assert_eq!(*destroyed.borrow(), vec![7, 6, 5]);
        assert!(cache.is_empty());
        cache.destroy_all(&mut arena);
        assert_eq!(destroyed.borrow().len(), 3);

        for key in 0..8 {
            assert!(cache.get(&mut arena, key).created);
        }
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn remove_skips_destroy_and_frees_the_slot() {
        let mut arena = Arena::new(1024);
        let (mut cache, destroyed) = recording(&mut arena, 2);
        let slot = cache.get(&mut arena, 1).slot;
        cache.get(&mut arena, 2);
        assert_eq!(cache.remove(&mut arena, &1), Some((1, 0)));
        assert!(destroyed.borrow().is_empty());
        assert_eq!(cache.remove_slot(&mut arena, slot), None);
        assert!(cache.value_mut(&mut arena, slot).is_none());
        let lookup = cache.get(&mut arena, 3);
        assert!(lookup.created);
        assert_eq!(lookup.slot, slot);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(keys(&cache, &arena), vec![3, 2]);
    }

    #[test]
    fn value_mut_writes_a_live_slot() {
        let mut arena = Arena::new(1024);
        let (mut cache, _) = recording(&mut arena, 2);
        let slot = cache.get(&mut arena, 9).slot;
        *cache.value_mut(&mut arena, slot).unwrap() = 90;
        assert_eq!(cache.search(&arena, &9), Some(&90));
        assert_eq!(cache.value_mut(&mut arena, 1), None);
        assert_eq!(cache.value_mut(&mut arena, 2), None);
    }

    #[test]
    fn colliding_keys_share_a_bucket() {
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
        struct Flat(u32);
        impl ContentHash for Flat {
            fn content_hash(&self) -> u32 {
                42
            }
        }
        let mut arena = Arena::new(1024);
        let budget = LruCache::<Flat, u32>::budget_for(3);
        let mut cache: LruCache<Flat, u32> =
            LruCache::new_in(&mut arena, "flat", budget, Box::new(|_, _| {})).unwrap();
        for n in 0..3 {
            *cache.get(&mut arena, Flat(n)).value = n + 10;
        }
        assert_eq!(cache.search(&arena, &Flat(1)), Some(&11));
        cache.get(&mut arena, Flat(3));
        assert!(cache.search(&arena, &Flat(0)).is_none());
        assert_eq!(cache.search(&arena, &Flat(2)), Some(&12));
        assert_eq!(cache.remove(&mut arena, &Flat(1)), Some((Flat(1), 11)));
        assert_eq!(cache.search(&arena, &Flat(3)), Some(&0));
    }

    #[test]
    fn entries_are_stored_in_the_reservation() {
        let mut arena = Arena::new(1024);
        let (mut cache, _) = recording(&mut arena, 8);
        for key in 0..8u32 {
            *cache.get(&mut arena, key).value = 0xAAAA_0000 | key;
        }
        let region = cache.reservation();
        for key in 0..8u32 {
            assert!(arena.words(region).contains(&(0xAAAA_0000 | key)));
        }

        for word in arena.words_mut(region) {
            if *word == 0xAAAA_0003 {
                *word = 0xBBBB_0003;
            }
        }
        assert_eq!(cache.search(&arena, &3), Some(&0xBBBB_0003));
        assert_eq!(arena.stats().back_bytes, region.byte_len());
    }

    #[test]
    fn wide_payloads_are_aligned() {
        let mut arena = Arena::new(1024);
        arena.push_back(4).unwrap();
        let budget = LruCache::<u32, u64>::budget_for(5);
        let mut cache: LruCache<u32, u64> =
            LruCache::new_in(&mut arena, "wide", budget, Box::new(|_, _| {})).unwrap();
        for key in 0..5u32 {
            *cache.get(&mut arena, key).value = u64::MAX - u64::from(key);
        }
        assert_eq!(cache.search(&arena, &4), Some(&(u64::MAX - 4)));
        assert_eq!(cache.iter(&arena).count(), 5);
    }

    #[test]
    fn budget_sizing_matches_the_formula() {
        let mut arena = Arena::new(4096);
        let stride = LruCache::<u32, u32>::slot_stride();
        assert_eq!(stride, 24);
        let cache: LruCache<u32, u32> =
            LruCache::new_in(&mut arena, "sized", 480, Box::new(|_, _| {})).unwrap();
        // 480 / 24 = 20 slots, 16 buckets, (480 - 64) / 24 = 17 slots.
        assert_eq!(cache.capacity(), 17);
        assert_eq!(arena.stats().back_bytes, 480);
        assert_eq!(cache.reservation().byte_len(), 480);
        assert_eq!(LruCache::<u32, u32>::budget_for(17), 17 * 24 + 16 * 4);
    }

    #[test]
    fn tiny_budget_is_rejected() {
        let mut arena = Arena::new(64);
        let err = LruCache::<u32, u32>::new_in(&mut arena, "tiny", 8, Box::new(|_, _| {}))
            .unwrap_err();
        assert!(matches!(err, LruError::BudgetTooSmall { budget: 8, .. }));
        assert_eq!(arena.stats().back_bytes, 0);

        let err = LruCache::<u32, u32>::new_in(&mut arena, "big", 128, Box::new(|_, _| {}))
            .unwrap_err();
        assert!(matches!(err, LruError::Arena(ArenaError::OutOfMemory { .. })));
    }

    #[test]
    fn zero_sized_payloads_are_rejected() {
        let mut arena = Arena::new(64);
        let err = LruCache::<u32, ()>::new_in(&mut arena, "unit", 48, Box::new(|_, _| {}))
            .unwrap_err();
        assert_eq!(err, LruError::ZeroSized { cache: "unit" });
        assert_eq!(arena.stats().back_bytes, 0);
    }
}
