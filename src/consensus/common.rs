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

//! The canonical hash contract every consensus message body obeys (§4.1):
//! `hash({primary_delegate_id?, epoch_number, sequence, timestamp?,
//! previous_hash, content})`. Request blocks hash their proposer and
//! timestamp in; archival blocks (micro/epoch) leave both out so every
//! delegate computes the same digest for a block none of them proposed
//! individually. A sequence-0 block additionally omits `previous_hash`,
//! since it has none.
//!
//! The original dispatches this by C++ template specialisation per message
//! type (§9 REDESIGN FLAGS); here it is one pure function plus a
//! `Hashable` trait each block body implements by describing its own
//! content bytes.

use crate::crypto::hash::{Hash, Hasher};

/// What kind of block is being hashed, and therefore which prequel fields
/// the digest includes.
pub enum BlockKind {
    /// A request block: primary id and timestamp are part of the digest.
    Request { primary_delegate_id: u8, timestamp_ms: u64 },
    /// A microblock or epoch block: no single proposer, so neither field
    /// is included.
    Archival,
}

/// Computes a block's canonical hash per the §4.1 contract.
pub fn block_hash(kind: &BlockKind, epoch_number: u32, sequence: u32, previous: &Hash, content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    if let BlockKind::Request { primary_delegate_id, timestamp_ms } = kind {
        hasher.update_u8(*primary_delegate_id);
        hasher.update_u64(*timestamp_ms);
    }
    hasher.update_u32(epoch_number);
    hasher.update_u32(sequence);
    if sequence != 0 {
        hasher.update_hash(previous);
    }
    hasher.update(content);
    hasher.finalize()
}

/// Implemented by every block body so `block_hash` can be called generically
/// without each caller re-deriving the field layout.
pub trait Hashable {
    fn kind(&self) -> BlockKind;
    fn epoch_number(&self) -> u32;
    fn sequence(&self) -> u32;
    fn previous(&self) -> Hash;
    /// The canonical content bytes hashed after the prequel fields —
    /// typically the wire encoding of the body minus the fields already
    /// covered by `kind`/`epoch_number`/`sequence`/`previous`.
    fn content_bytes(&self) -> Vec<u8>;

    fn hash(&self) -> Hash {
        block_hash(&self.kind(), self.epoch_number(), self.sequence(), &self.previous(), &self.content_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_zero_omits_previous_hash() {
        let content = b"batch contents";
        let with_real_previous =
            block_hash(&BlockKind::Archival, 1, 0, &Hash([9u8; 32]), content);
        let with_zero_previous = block_hash(&BlockKind::Archival, 1, 0, &Hash::ZERO, content);
        assert_eq!(with_real_previous, with_zero_previous);
    }

    #[test]
    fn request_and_archival_hash_differently_for_same_content() {
        let previous = Hash([1u8; 32]);
        let content = b"same content";
        let request = block_hash(
            &BlockKind::Request { primary_delegate_id: 3, timestamp_ms: 1000 },
            2,
            5,
            &previous,
            content,
        );
        let archival = block_hash(&BlockKind::Archival, 2, 5, &previous, content);
        assert_ne!(request, archival);
    }

    #[test]
    fn archival_hash_is_delegate_agnostic() {
        // Two delegates computing the same microblock must get the same
        // digest even though only one of them proposed it — there is no
        // primary_delegate_id field to disagree on.
        let previous = Hash([4u8; 32]);
        let content = b"microblock content";
        let a = block_hash(&BlockKind::Archival, 9, 1, &previous, content);
        let b = block_hash(&BlockKind::Archival, 9, 1, &previous, content);
        assert_eq!(a, b);
    }
}
