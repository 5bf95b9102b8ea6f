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

//! `EpochBlock` construction and validation (§4.4.3), grounded on
//! `original_source/logos/epoch/epoch_handler.cpp`'s `BuildEpochBlock`.

use std::io::{self, Read, Write};

use crate::codec::{Decodable, Encodable};
use crate::consensus::common::{BlockKind, Hashable};
use crate::crypto::Hash;
use crate::net::messages::PrePrepareCommon;
use crate::net::NUM_DELEGATES;

/// One elected delegate's committee entry (§4.5.3 voting power feeds
/// selection; the descriptor itself just records the outcome).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegateDescriptor {
    pub account: Hash,
    pub stake: u64,
}

impl Encodable for DelegateDescriptor {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.account.encode(w)?;
        n += self.stake.encode(w)?;
        Ok(n)
    }
}

impl Decodable for DelegateDescriptor {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(DelegateDescriptor { account: Hash::decode(r)?, stake: u64::decode(r)? })
    }
}

/// The block that closes out one epoch's committee (§3, §4.4.3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochBlock {
    pub common: PrePrepareCommon,
    pub epoch_number: u32,
    pub delegates: [DelegateDescriptor; NUM_DELEGATES],
    pub transaction_fee_pool: u128,
    pub micro_block_tip: Hash,
    pub prepare_participation_map: u64,
    pub prepare_agg_sig: crate::crypto::bls::Signature,
    pub commit_participation_map: u64,
    pub commit_agg_sig: crate::crypto::bls::Signature,
}

impl Hashable for EpochBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::Archival
    }

    fn epoch_number(&self) -> u32 {
        self.epoch_number
    }

    fn sequence(&self) -> u32 {
        0
    }

    fn previous(&self) -> Hash {
        self.common.previous
    }

    fn content_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for d in &self.delegates {
            d.encode(&mut buf).expect("writing to a Vec never fails");
        }
        self.transaction_fee_pool.encode(&mut buf).expect("writing to a Vec never fails");
        self.micro_block_tip.encode(&mut buf).expect("writing to a Vec never fails");
        buf
    }
}

impl Encodable for EpochBlock {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.common.encode(w)?;
        n += self.epoch_number.encode(w)?;
        for d in &self.delegates {
            n += d.encode(w)?;
        }
        n += self.transaction_fee_pool.encode(w)?;
        n += self.micro_block_tip.encode(w)?;
        n += self.prepare_participation_map.encode(w)?;
        n += self.prepare_agg_sig.encode(w)?;
        n += self.commit_participation_map.encode(w)?;
        n += self.commit_agg_sig.encode(w)?;
        Ok(n)
    }
}

impl Decodable for EpochBlock {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let common = PrePrepareCommon::decode(r)?;
        let epoch_number = u32::decode(r)?;
        let mut delegates = [DelegateDescriptor { account: Hash::ZERO, stake: 0 }; NUM_DELEGATES];
        for slot in delegates.iter_mut() {
            *slot = DelegateDescriptor::decode(r)?;
        }
        Ok(EpochBlock {
            common,
            epoch_number,
            delegates,
            transaction_fee_pool: u128::decode(r)?,
            micro_block_tip: Hash::decode(r)?,
            prepare_participation_map: u64::decode(r)?,
            prepare_agg_sig: crate::crypto::bls::Signature::decode(r)?,
            commit_participation_map: u64::decode(r)?,
            commit_agg_sig: crate::crypto::bls::Signature::decode(r)?,
        })
    }
}

/// Validates `block` against the epoch it claims to close out (§4.4.3):
/// chain continuity, a fresh micro tip, and a delegate set that matches
/// what `expected_delegates` (the output of `staking::election`) selected.
pub fn validate(
    block: &EpochBlock,
    prev_epoch_number: u32,
    closing_micro_tip: Hash,
    expected_delegates: &[DelegateDescriptor; NUM_DELEGATES],
) -> Result<(), super::ArchivalError> {
    use super::ArchivalError as E;

    if block.epoch_number != prev_epoch_number + 1 {
        return Err(E::BadChain)
    }
    if block.micro_block_tip != closing_micro_tip {
        return Err(E::StaleMicroTip)
    }
    if &block.delegates != expected_delegates {
        return Err(E::IllegalDelegateSet)
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::roundtrip;
    use crate::crypto::bls::SecretKey;
    use rand::rngs::OsRng;

    fn sample_delegates() -> [DelegateDescriptor; NUM_DELEGATES] {
        let mut delegates = [DelegateDescriptor { account: Hash::ZERO, stake: 0 }; NUM_DELEGATES];
        for (i, slot) in delegates.iter_mut().enumerate() {
            *slot = DelegateDescriptor { account: Hash([i as u8; 32]), stake: 1000 + i as u64 };
        }
        delegates
    }

    #[test]
    fn epoch_block_roundtrips() {
        let sk = SecretKey::random(&mut OsRng);
        let round_hash = crate::crypto::hash::hash_bytes(b"epoch round");
        let block = EpochBlock {
            common: PrePrepareCommon {
                primary_delegate_id: 3,
                epoch_number: 5,
                sequence: 0,
                timestamp_ms: 0,
                previous: Hash([7u8; 32]),
                primary_sig: sk.sign(&round_hash),
            },
            epoch_number: 5,
            delegates: sample_delegates(),
            transaction_fee_pool: 42_000,
            micro_block_tip: Hash([8u8; 32]),
            prepare_participation_map: 0xffff_ffff,
            prepare_agg_sig: sk.sign(&round_hash),
            commit_participation_map: 0xffff_ffff,
            commit_agg_sig: sk.sign(&round_hash),
        };
        assert!(roundtrip(&block));
    }

    #[test]
    fn validate_checks_epoch_chain_and_micro_tip_and_delegates() {
        let sk = SecretKey::random(&mut OsRng);
        let round_hash = crate::crypto::hash::hash_bytes(b"epoch round");
        let delegates = sample_delegates();
        let block = EpochBlock {
            common: PrePrepareCommon {
                primary_delegate_id: 0,
                epoch_number: 5,
                sequence: 0,
                timestamp_ms: 0,
                previous: Hash::ZERO,
                primary_sig: sk.sign(&round_hash),
            },
            epoch_number: 5,
            delegates,
            transaction_fee_pool: 0,
            micro_block_tip: Hash([1u8; 32]),
            prepare_participation_map: 0,
            prepare_agg_sig: sk.sign(&round_hash),
            commit_participation_map: 0,
            commit_agg_sig: sk.sign(&round_hash),
        };

        assert!(validate(&block, 4, Hash([1u8; 32]), &delegates).is_ok());
        assert_eq!(validate(&block, 3, Hash([1u8; 32]), &delegates), Err(super::super::ArchivalError::BadChain));
        assert_eq!(
            validate(&block, 4, Hash([2u8; 32]), &delegates),
            Err(super::super::ArchivalError::StaleMicroTip)
        );
    }
}
