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

//! `Tip` / `TipSet` (§4.6.1), grounded on
//! `original_source/logos/bootstrap/tips.hpp`. A `Tip` names the head of one
//! chain (epoch block chain, microblock chain, or one of the 32 delegate
//! request-block chains) by epoch/sequence/digest; a `TipSet` is the full
//! snapshot a node advertises and compares against a peer's to decide
//! whether, and how far, it is behind.

use std::io::{self, Read, Write};

use crate::codec::{Decodable, Encodable};
use crate::crypto::Hash;
use crate::net::NUM_DELEGATES;

/// Head of a single chain: `epoch_number | sequence | digest` (40 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Tip {
    pub epoch: u32,
    pub sequence: u32,
    pub digest: Hash,
}

impl Tip {
    pub const ZERO: Tip = Tip { epoch: 0, sequence: 0, digest: Hash::ZERO };

    pub fn new(epoch: u32, sequence: u32, digest: Hash) -> Self {
        Tip { epoch, sequence, digest }
    }

    /// Whether `self` names strictly more progress than `other`: a later
    /// epoch always wins; within the same epoch, a later sequence wins.
    pub fn is_ahead_of(&self, other: &Tip) -> bool {
        (self.epoch, self.sequence) > (other.epoch, other.sequence)
    }
}

impl Encodable for Tip {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.epoch.encode(w)?;
        n += self.sequence.encode(w)?;
        n += self.digest.encode(w)?;
        Ok(n)
    }
}

impl Decodable for Tip {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let epoch = u32::decode(r)?;
        let sequence = u32::decode(r)?;
        let digest = Hash::decode(r)?;
        Ok(Tip { epoch, sequence, digest })
    }
}

/// A node's full chain-head snapshot: the epoch chain tip, the microblock
/// chain tip, and one tip per delegate request-block chain — both the
/// chain as currently assigned (`bsb`) and, during an epoch transition, the
/// chain each delegate is handing off to in the new epoch (`bsb_new_epoch`,
/// only non-zero while a transition is in flight).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TipSet {
    pub eb: Tip,
    pub mb: Tip,
    pub bsb: [Tip; NUM_DELEGATES],
    pub bsb_new_epoch: [Tip; NUM_DELEGATES],
    /// Cumulative count of request blocks ever committed, used to estimate
    /// how many blocks a peer is behind by (`ComputeNumberBlocksBehind`).
    pub cumulative_request_block_count: u64,
}

impl Default for TipSet {
    fn default() -> Self {
        TipSet {
            eb: Tip::ZERO,
            mb: Tip::ZERO,
            bsb: [Tip::ZERO; NUM_DELEGATES],
            bsb_new_epoch: [Tip::ZERO; NUM_DELEGATES],
            cumulative_request_block_count: 0,
        }
    }
}

impl TipSet {
    /// Whether `self` (a locally known tip set) lags `peer` on any of the
    /// tracked chains — mirrors `TipSet::IsBehind`.
    pub fn is_behind(&self, peer: &TipSet) -> bool {
        if peer.eb.is_ahead_of(&self.eb) {
            return true
        }
        if peer.mb.is_ahead_of(&self.mb) {
            return true
        }
        for i in 0..NUM_DELEGATES {
            if peer.bsb[i].is_ahead_of(&self.bsb[i]) {
                return true
            }
        }
        for i in 0..NUM_DELEGATES {
            if peer.bsb_new_epoch[i].is_ahead_of(&self.bsb_new_epoch[i]) {
                return true
            }
        }
        false
    }

    /// Highest epoch number referenced anywhere in the tip set.
    pub fn latest_epoch_number(&self) -> u32 {
        let mut latest = self.eb.epoch.max(self.mb.epoch);
        for tip in self.bsb.iter().chain(self.bsb_new_epoch.iter()) {
            latest = latest.max(tip.epoch);
        }
        latest
    }
}

impl Encodable for TipSet {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.eb.encode(w)?;
        n += self.mb.encode(w)?;
        for tip in &self.bsb {
            n += tip.encode(w)?;
        }
        for tip in &self.bsb_new_epoch {
            n += tip.encode(w)?;
        }
        n += self.cumulative_request_block_count.encode(w)?;
        Ok(n)
    }
}

impl Decodable for TipSet {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let eb = Tip::decode(r)?;
        let mb = Tip::decode(r)?;
        let mut bsb = [Tip::ZERO; NUM_DELEGATES];
        for slot in bsb.iter_mut() {
            *slot = Tip::decode(r)?;
        }
        let mut bsb_new_epoch = [Tip::ZERO; NUM_DELEGATES];
        for slot in bsb_new_epoch.iter_mut() {
            *slot = Tip::decode(r)?;
        }
        let cumulative_request_block_count = u64::decode(r)?;
        Ok(TipSet { eb, mb, bsb, bsb_new_epoch, cumulative_request_block_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::roundtrip;

    #[test]
    fn tip_set_roundtrip() {
        let mut tips = TipSet::default();
        tips.eb = Tip::new(3, 0, Hash([7u8; 32]));
        tips.bsb[5] = Tip::new(3, 14, Hash([9u8; 32]));
        assert!(roundtrip(&tips));
    }

    #[test]
    fn behind_on_single_delegate_chain_is_detected() {
        let mut local = TipSet::default();
        let mut peer = TipSet::default();
        peer.bsb[3] = Tip::new(1, 5, Hash([1u8; 32]));

        assert!(local.is_behind(&peer));
        local.bsb[3] = peer.bsb[3];
        assert!(!local.is_behind(&peer));
    }

    #[test]
    fn same_epoch_higher_sequence_is_ahead() {
        let a = Tip::new(2, 10, Hash::ZERO);
        let b = Tip::new(2, 11, Hash::ZERO);
        assert!(b.is_ahead_of(&a));
        assert!(!a.is_ahead_of(&b));
    }
}
