/* This file is part of dbft-core
 *
 * Copyright (C) 2024-2026 dbft-core Contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! 256-bit Blake2b digests, used for every hash in the data model (§3).

use blake2::{digest::consts::U32, Blake2b, Digest};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

pub const HASH_SIZE: usize = 32;

/// A 32-byte Blake2b digest. The zero digest is a valid sentinel value
/// (e.g. the previous-hash of a sequence-0 request-block, or an unset tip)
/// and is ordered as "lower than any non-zero digest" by [`Hash::is_zero`]
/// consumers such as `Tip`'s ordering (§4.6.1).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Hash(pub [u8; HASH_SIZE]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Hash> {
        if bytes.len() != HASH_SIZE {
            return None
        }
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(bytes);
        Some(Hash(out))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Incremental hasher used to build a message's canonical digest piece by
/// piece, mirroring `Blake2bHash(const T&)` in the original: each hashable
/// view streams its fields into one running Blake2b-256 state rather than
/// concatenating an intermediate buffer.
pub struct Hasher(Blake2b256);

impl Hasher {
    pub fn new() -> Self {
        Hasher(Blake2b256::new())
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.update(bytes);
        self
    }

    pub fn update_u8(&mut self, v: u8) -> &mut Self {
        self.update(&[v])
    }

    pub fn update_u32(&mut self, v: u32) -> &mut Self {
        self.update(&v.to_le_bytes())
    }

    pub fn update_u64(&mut self, v: u64) -> &mut Self {
        self.update(&v.to_le_bytes())
    }

    pub fn update_hash(&mut self, h: &Hash) -> &mut Self {
        self.update(&h.0)
    }

    pub fn finalize(self) -> Hash {
        let digest = self.0.finalize();
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(&digest);
        Hash(out)
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash {
    let mut h = Hasher::new();
    h.update(bytes);
    h.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_default_and_lowest() {
        assert!(Hash::default().is_zero());
        let nonzero = hash_bytes(b"hello");
        assert!(Hash::ZERO < nonzero);
    }

    #[test]
    fn hasher_matches_single_update() {
        let mut incremental = Hasher::new();
        incremental.update(b"foo").update(b"bar");
        let combined = hash_bytes(b"foobar");
        assert_eq!(incremental.finalize(), combined);
    }
}
