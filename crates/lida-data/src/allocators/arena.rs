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

//! A fixed-size, two-sided bump allocator.
//!
//! The buffer is split by two cursors. The front side grows upward from word
//! zero and holds transient scratch data that is released in exact reverse
//! order. The back side grows downward from the end and holds permanent
//! reservations made once at initialization. Permanent regions start on an
//! eight-byte boundary.
//!
//! ```text
//! [ front (transient) -> | free | <- back (permanent) ]
//! 0                     low    high                  len
//! ```

use bytemuck::Pod;
use lida_core::memory::ArenaStats;
use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Size in bytes of one arena word. Every request is rounded up to whole words.
pub const WORD_SIZE: usize = mem::size_of::<u32>();

/// Alignment in bytes of every permanent region.
pub const BACK_ALIGN: usize = mem::align_of::<u64>();

const WORDS_PER_BLOCK: usize = BACK_ALIGN / WORD_SIZE;

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// Errors raised by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The request does not fit between the two cursors.
    #[error("arena out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes requested, rounded to whole words.
        requested: usize,
        /// Bytes left between the front and back cursors.
        available: usize,
    },
    /// A front-side region was released after a region below it.
    #[error("stale release of arena offset {offset} (front cursor at {low})")]
    StaleRelease {
        /// Word offset of the released region.
        offset: usize,
        /// Word offset of the front cursor at the time of the release.
        low: usize,
    },
    /// The requested element type needs more alignment than a word provides.
    #[error("type alignment {align} exceeds the arena word alignment")]
    Misaligned {
        /// Alignment of the requested type.
        align: usize,
    },
}

/// A region of the arena, measured in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaPtr {
    offset: usize,
    len: usize,
}

impl ArenaPtr {
    /// Word offset of the region inside the arena buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the region in words.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the region holds no words.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the region in bytes.
    pub fn byte_len(&self) -> usize {
        self.len * WORD_SIZE
    }
}

/// Rounds a byte count up to whole words.
pub(crate) fn words_for(bytes: usize) -> usize {
    bytes.div_ceil(WORD_SIZE)
}

/// The fixed buffer and its two cursors.
///
/// The buffer is allocated once by [`Arena::new`] and never grows.
#[derive(Debug)]
pub struct Arena {
    id: u32,
    blocks: Box<[u64]>,
    low: usize,
    high: usize,
    peak_low: usize,
}

impl Arena {
    /// Creates an arena of `bytes` bytes, rounded up to a multiple of
    /// [`BACK_ALIGN`].
    pub fn new(bytes: usize) -> Self {
        let blocks = bytes.div_ceil(BACK_ALIGN);
        let len = blocks * WORDS_PER_BLOCK;
        log::debug!("Arena created with {} bytes", len * WORD_SIZE);
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            blocks: vec![0u64; blocks].into_boxed_slice(),
            low: 0,
            high: len,
            peak_low: 0,
        }
    }

    /// A value unique to this arena among all arenas of the process.
    pub fn id(&self) -> u32 {
        self.id
    }

    fn all_words(&self) -> &[u32] {
        bytemuck::cast_slice(&self.blocks[..])
    }

    fn all_words_mut(&mut self) -> &mut [u32] {
        bytemuck::cast_slice_mut(&mut self.blocks[..])
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.blocks.len() * BACK_ALIGN
    }

    /// Bytes left between the two cursors.
    pub fn available(&self) -> usize {
        (self.high - self.low) * WORD_SIZE
    }

    fn check_fit(&self, words: usize) -> Result<usize, ArenaError> {
        if words > self.high - self.low {
            let err = ArenaError::OutOfMemory {
                requested: words * WORD_SIZE,
                available: self.available(),
            };
            log::error!("{err}");
            return Err(err);
        }
        Ok(words)
    }

    /// Reserves `bytes` on the transient side.
    ///
    /// ## Errors
    ///
    /// [`ArenaError::OutOfMemory`] if the region would cross the back cursor.
    /// The arena is left unchanged.
    pub fn push_front(&mut self, bytes: usize) -> Result<ArenaPtr, ArenaError> {
        let len = self.check_fit(words_for(bytes))?;
        let ptr = ArenaPtr {
            offset: self.low,
            len,
        };
        self.low += len;
        self.peak_low = self.peak_low.max(self.low);
        let low = self.low;
        self.all_words_mut()[ptr.offset..low].fill(0);
        Ok(ptr)
    }

    /// Releases a transient region and everything pushed after it.
    ///
    /// Regions must be released in reverse order of their pushes.
    ///
    /// ## Errors
    ///
    /// [`ArenaError::StaleRelease`] if `ptr` lies above the front cursor, which
    /// means it was already released.
    pub fn pop_front(&mut self, ptr: ArenaPtr) -> Result<(), ArenaError> {
        if ptr.offset > self.low {
            let err = ArenaError::StaleRelease {
                offset: ptr.offset,
                low: self.low,
            };
            log::error!("{err}");
            return Err(err);
        }
        self.low = ptr.offset;
        Ok(())
    }

    /// Reserves `bytes` on the permanent side, rounded up to a multiple of
    /// [`BACK_ALIGN`]. The region is zeroed and starts on a [`BACK_ALIGN`]
    /// boundary. Permanent regions are never released individually.
    ///
    /// ## Errors
    ///
    /// [`ArenaError::OutOfMemory`] if the region would cross the front cursor.
    pub fn push_back(&mut self, bytes: usize) -> Result<ArenaPtr, ArenaError> {
        let len = self.check_fit(bytes.div_ceil(BACK_ALIGN) * WORDS_PER_BLOCK)?;
        self.high -= len;
        let ptr = ArenaPtr {
            offset: self.high,
            len,
        };
        self.words_mut(ptr).fill(0);
        Ok(ptr)
    }

    /// The words of a region.
    pub fn words(&self, ptr: ArenaPtr) -> &[u32] {
        &self.all_words()[ptr.offset..ptr.offset + ptr.len]
    }

    /// The words of a region, mutably.
    pub fn words_mut(&mut self, ptr: ArenaPtr) -> &mut [u32] {
        &mut self.all_words_mut()[ptr.offset..ptr.offset + ptr.len]
    }

    /// The bytes of a region.
    pub fn bytes(&self, ptr: ArenaPtr) -> &[u8] {
        bytemuck::cast_slice(self.words(ptr))
    }

    /// The bytes of a region, mutably.
    pub fn bytes_mut(&mut self, ptr: ArenaPtr) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.words_mut(ptr))
    }

    /// Opens a scoped view over the free part of the transient side.
    ///
    /// Everything allocated through the returned [`Scratch`] is released when
    /// it is dropped.
    pub fn scratch(&mut self) -> Scratch<'_> {
        let Arena {
            blocks,
            low,
            high,
            peak_low,
            ..
        } = self;
        let mark = *low;
        let words: &mut [u32] = bytemuck::cast_slice_mut(&mut blocks[..]);
        let free = &mut words[*low..*high];
        Scratch {
            free,
            low,
            peak: peak_low,
            mark,
        }
    }

    /// A snapshot of the arena's occupancy.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity_bytes: self.capacity(),
            front_bytes: self.low * WORD_SIZE,
            back_bytes: (self.all_words().len() - self.high) * WORD_SIZE,
            peak_front_bytes: self.peak_low * WORD_SIZE,
        }
    }
}

/// A scoped allocation context over the transient side of an [`Arena`].
///
/// Slices handed out by [`Scratch::alloc`] borrow the arena for the scope's
/// lifetime. Dropping the scope rewinds the front cursor to where it was when
/// the scope was opened, on every exit path.
pub struct Scratch<'a> {
    free: &'a mut [u32],
    low: &'a mut usize,
    peak: &'a mut usize,
    mark: usize,
}

impl<'a> Scratch<'a> {
    /// Bytes left in the scope.
    pub fn remaining_bytes(&self) -> usize {
        self.free.len() * WORD_SIZE
    }

    /// Carves `count` zeroed elements of `T` out of the scope.
    ///
    /// ## Errors
    ///
    /// - [`ArenaError::Misaligned`] if `T` needs more than word alignment.
    /// - [`ArenaError::OutOfMemory`] if the scope has no room left.
    pub fn alloc<T: Pod>(&mut self, count: usize) -> Result<&'a mut [T], ArenaError> {
        let align = mem::align_of::<T>();
        if align > WORD_SIZE {
            return Err(ArenaError::Misaligned { align });
        }
        let size = mem::size_of::<T>();
        if size == 0 || count == 0 {
            return Ok(&mut []);
        }
        let bytes = size.checked_mul(count).ok_or(ArenaError::OutOfMemory {
            requested: usize::MAX,
            available: self.remaining_bytes(),
        })?;
        let words = words_for(bytes);
        if words > self.free.len() {
            let err = ArenaError::OutOfMemory {
                requested: words * WORD_SIZE,
                available: self.remaining_bytes(),
            };
            log::error!("{err}");
            return Err(err);
        }

        let free = mem::take(&mut self.free);
        let (head, tail) = free.split_at_mut(words);
        self.free = tail;
        *self.low += words;
        *self.peak = (*self.peak).max(*self.low);

        head.fill(0);
        let head_bytes: &'a mut [u8] = bytemuck::cast_slice_mut(head);
        bytemuck::try_cast_slice_mut(&mut head_bytes[..bytes])
            .map_err(|_| ArenaError::Misaligned { align })
    }

    /// Opens a nested scope. Allocations made through it are released when it
    /// is dropped, leaving this scope's allocations in place.
    pub fn nested(&mut self) -> Scratch<'_> {
        let mark = *self.low;
        Scratch {
            free: &mut *self.free,
            low: &mut *self.low,
            peak: &mut *self.peak,
            mark,
        }
    }

    /// Copies `src` into the scope and returns the copy.
    ///
    /// ## Errors
    ///
    /// Same as [`Scratch::alloc`].
    pub fn alloc_copy<T: Pod>(&mut self, src: &[T]) -> Result<&'a mut [T], ArenaError> {
        let dst = self.alloc::<T>(src.len())?;
        dst.copy_from_slice(src);
        Ok(dst)
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        *self.low = self.mark;
    }
}

impl std::fmt::Debug for Scratch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scratch")
            .field("mark", &self.mark)
            .field("low", &*self.low)
            .field("remaining_bytes", &self.remaining_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rounds_up_to_words() {
        let mut arena = Arena::new(64);
        let ptr = arena.push_front(5).unwrap();
        assert_eq!(ptr.len(), 2);
        assert_eq!(arena.stats().front_bytes, 8);
    }

    #[test]
    fn pushes_then_reverse_pops_restore_front() {
        let mut arena = Arena::new(256);
        let before = arena.stats().front_bytes;
        let a = arena.push_front(12).unwrap();
        let b = arena.push_front(40).unwrap();
        let c = arena.push_front(1).unwrap();
        arena.pop_front(c).unwrap();
        arena.pop_front(b).unwrap();
        arena.pop_front(a).unwrap();
        assert_eq!(arena.stats().front_bytes, before);
        assert_eq!(arena.stats().peak_front_bytes, 56);
    }

    #[test]
    fn stale_release_is_rejected() {
        let mut arena = Arena::new(64);
        let a = arena.push_front(4).unwrap();
        let b = arena.push_front(4).unwrap();
        arena.pop_front(a).unwrap();
        assert_eq!(
            arena.pop_front(b),
            Err(ArenaError::StaleRelease { offset: 1, low: 0 })
        );
    }

    #[test]
    fn sides_never_cross() {
        let mut arena = Arena::new(32);
        arena.push_back(16).unwrap();
        arena.push_front(12).unwrap();
        let err = arena.push_front(8).unwrap_err();
        assert_eq!(
            err,
            ArenaError::OutOfMemory {
                requested: 8,
                available: 4
            }
        );
        assert_eq!(arena.stats().front_bytes, 12);
        assert!(arena.push_back(8).is_err());
        assert_eq!(arena.stats().back_bytes, 16);
    }

    #[test]
    fn back_side_regions_are_addressable() {
        let mut arena = Arena::new(32);
        let ptr = arena.push_back(8).unwrap();
        assert_eq!(ptr.offset(), 6);
        arena.words_mut(ptr).copy_from_slice(&[7, 9]);
        assert_eq!(arena.words(ptr), &[7, 9]);
        assert_eq!(arena.bytes_mut(ptr).len(), 8);
    }

    #[test]
    fn back_side_regions_are_block_aligned() {
        let mut arena = Arena::new(30);
        assert_eq!(arena.capacity(), 32);
        let odd = arena.push_back(4).unwrap();
        assert_eq!(odd.byte_len(), BACK_ALIGN);
        let next = arena.push_back(12).unwrap();
        assert_eq!(next.byte_len(), 16);
        for ptr in [odd, next] {
            assert_eq!(arena.bytes(ptr).as_ptr() as usize % BACK_ALIGN, 0);
            assert!(bytemuck::try_cast_slice::<u8, u64>(arena.bytes(ptr)).is_ok());
        }
        assert_eq!(arena.stats().back_bytes, 24);
    }

    #[test]
    fn back_side_regions_start_zeroed() {
        let mut arena = Arena::new(64);
        let front = arena.push_front(64).unwrap();
        arena.words_mut(front).fill(u32::MAX);
        arena.pop_front(front).unwrap();
        let ptr = arena.push_back(32).unwrap();
        assert!(arena.words(ptr).iter().all(|&w| w == 0));
    }

    #[test]
    fn arenas_have_distinct_ids() {
        assert_ne!(Arena::new(8).id(), Arena::new(8).id());
    }

    #[test]
    fn scratch_rewinds_on_drop() {
        let mut arena = Arena::new(128);
        arena.push_front(8).unwrap();
        {
            let mut scratch = arena.scratch();
            let a = scratch.alloc::<u32>(4).unwrap();
            let b = scratch.alloc::<u16>(3).unwrap();
            a[0] = 1;
            b[2] = 2;
            assert_eq!(scratch.remaining_bytes(), 128 - 8 - 16 - 8);
        }
        assert_eq!(arena.stats().front_bytes, 8);
        assert_eq!(arena.stats().peak_front_bytes, 32);
    }

    #[test]
    fn scratch_rewinds_on_early_return() {
        fn fails(arena: &mut Arena) -> Result<(), ArenaError> {
            let mut scratch = arena.scratch();
            scratch.alloc::<u32>(2)?;
            scratch.alloc::<u32>(1000)?;
            Ok(())
        }
        let mut arena = Arena::new(64);
        assert!(fails(&mut arena).is_err());
        assert_eq!(arena.stats().front_bytes, 0);
    }

    #[test]
    fn scratch_allocations_are_zeroed_and_disjoint() {
        let mut arena = Arena::new(64);
        {
            let mut scratch = arena.scratch();
            let a = scratch.alloc::<u32>(2).unwrap();
            a.fill(u32::MAX);
        }
        let mut scratch = arena.scratch();
        let a = scratch.alloc::<u32>(2).unwrap();
        let b = scratch.alloc_copy(&[3u8, 4, 5]).unwrap();
        assert_eq!(a, &[0, 0]);
        assert_eq!(b, &[3, 4, 5]);
    }

    #[test]
    fn nested_scope_releases_only_its_allocations() {
        let mut arena = Arena::new(64);
        let mut outer = arena.scratch();
        let kept = outer.alloc::<u32>(2).unwrap();
        {
            let mut inner = outer.nested();
            inner.alloc::<u32>(4).unwrap();
            assert_eq!(inner.remaining_bytes(), 64 - 8 - 16);
        }
        assert_eq!(outer.remaining_bytes(), 64 - 8);
        kept[1] = 5;
        let next = outer.alloc::<u32>(1).unwrap();
        assert_eq!(next, &[0]);
        assert_eq!(kept, &[0, 5]);
    }

    #[test]
    fn scratch_rejects_over_aligned_types() {
        let mut arena = Arena::new(64);
        let mut scratch = arena.scratch();
        assert_eq!(
            scratch.alloc::<u64>(1),
            Err(ArenaError::Misaligned { align: 8 })
        );
    }
}
