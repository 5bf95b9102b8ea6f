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

//! Merkle root over an ordered sequence of request-block hashes (§4.4.1,
//! §8 invariant 5): odd counts are padded by duplicating the last hash
//! rather than a distinguished padding value.

use crate::crypto::hash::{Hash, Hasher};

pub fn merkle_root(hashes: &[Hash]) -> Hash {
    if hashes.is_empty() {
        return Hash::ZERO
    }
    let mut level = hashes.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().unwrap());
        }
        level = level
            .chunks_exact(2)
            .map(|pair| {
                let mut hasher = Hasher::new();
                hasher.update_hash(&pair[0]);
                hasher.update_hash(&pair[1]);
                hasher.finalize()
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_is_zero() {
        assert_eq!(merkle_root(&[]), Hash::ZERO);
    }

    #[test]
    fn single_hash_is_its_own_root() {
        let h = Hash([3u8; 32]);
        assert_eq!(merkle_root(&[h]), h);
    }

    #[test]
    fn odd_count_duplicates_last_hash() {
        let a = Hash([1u8; 32]);
        let b = Hash([2u8; 32]);
        let c = Hash([3u8; 32]);
        let odd = merkle_root(&[a, b, c]);
        let manually_padded = merkle_root(&[a, b, c, c]);
        assert_eq!(odd, manually_padded);
    }

    #[test]
    fn order_matters() {
        let a = Hash([1u8; 32]);
        let b = Hash([2u8; 32]);
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
    }
}
