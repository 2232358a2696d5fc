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

//! Content hashes for cache keys.

const MURMUR_SEED: u32 = 909_713;
const MURMUR_M: u32 = 0x5bd1_e995;
const MURMUR_R: u32 = 24;

const STRING_P: u32 = 31;
const STRING_M: u32 = 1_000_009;

/// A value that can be located in an [`LruCache`](super::LruCache) by its content.
///
/// Two keys that compare equal must produce the same hash.
pub trait ContentHash {
    /// The 32-bit content hash of the value.
    fn content_hash(&self) -> u32;
}

impl ContentHash for u32 {
    fn content_hash(&self) -> u32 {
        hash_words(&[*self])
    }
}

impl ContentHash for String {
    fn content_hash(&self) -> u32 {
        hash_string(self)
    }
}

#[inline]
fn mix_word(h: u32, k: u32) -> u32 {
    let mut k = k.wrapping_mul(MURMUR_M);
    k ^= k >> MURMUR_R;
    k = k.wrapping_mul(MURMUR_M);
    h.wrapping_mul(MURMUR_M) ^ k
}

#[inline]
fn finalize(mut h: u32) -> u32 {
    h ^= h >> 13;
    h = h.wrapping_mul(MURMUR_M);
    h ^ (h >> 15)
}

/// MurmurHash2 over a byte slice, words read little-endian.
pub fn hash_memory(bytes: &[u8]) -> u32 {
    let mut h = MURMUR_SEED ^ bytes.len() as u32;
    let mut chunks = bytes.chunks_exact(4);
    for chunk in &mut chunks {
        h = mix_word(h, u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        if tail.len() == 3 {
            h ^= u32::from(tail[2]) << 16;
        }
        if tail.len() >= 2 {
            h ^= u32::from(tail[1]) << 8;
        }
        h ^= u32::from(tail[0]);
        h = h.wrapping_mul(MURMUR_M);
    }
    finalize(h)
}

/// [`hash_memory`] over the little-endian bytes of `words`, without the copy.
pub fn hash_words(words: &[u32]) -> u32 {
    let byte_len = (words.len() * 4) as u32;
    let h = words
        .iter()
        .fold(MURMUR_SEED ^ byte_len, |h, &k| mix_word(h, k));
    finalize(h)
}

/// Polynomial rolling hash of a string, modulo 1 000 009.
pub fn hash_string(s: &str) -> u32 {
    let mut hash = 0u32;
    let mut p_pow = 1u32;
    for &byte in s.as_bytes() {
        // Bytes are weighted relative to 'a', as signed characters.
        let weight = (i32::from(byte as i8) - i32::from(b'a') + 1) as u32;
        hash = hash.wrapping_add(weight.wrapping_mul(p_pow)) % STRING_M;
        p_pow = p_pow.wrapping_mul(STRING_P) % STRING_M;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_and_bytes_agree() {
        let words = [0xdead_beef, 7, 0x0102_0304];
        let bytes: Vec<u8> = words.iter().flat_map(|w: &u32| w.to_le_bytes()).collect();
        assert_eq!(hash_words(&words), hash_memory(&bytes));
        assert_eq!(hash_words(&[]), hash_memory(&[]));
    }

    #[test]
    fn tail_bytes_contribute() {
        let a = hash_memory(&[1, 2, 3, 4, 5]);
        let b = hash_memory(&[1, 2, 3, 4, 6]);
        let c = hash_memory(&[1, 2, 3, 4, 5, 0]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn string_hash_matches_the_rolling_formula() {
        assert_eq!(hash_string(""), 0);
        assert_eq!(hash_string("a"), 1);
        // b + c*31 = 2 + 3*31
        assert_eq!(hash_string("bc"), 95);
        assert!(hash_string("shaders/triangle.vert") < STRING_M);
        assert_eq!("quad".to_string().content_hash(), hash_string("quad"));
    }
}
