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

//! Consensus envelope messages (§4.1, §4.2, §6), grounded on
//! `original_source/logos/consensus/messages/common.hpp` and
//! `message_validator.hpp`. Block bodies (`RequestBlock`, `MicroBlock`,
//! `EpochBlock`) live with the modules that build and validate them; this
//! file holds the round-trip messages a primary and its backups exchange.

use std::io::{self, Read, Write};

use crate::codec::{Decodable, Encodable};
use crate::crypto::bls::{PublicKey, Signature, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::crypto::Hash;
use crate::error::RejectionReason;
use crate::net::ConsensusType;

impl Encodable for Signature {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        self.to_bytes().encode(w)
    }
}

impl Decodable for Signature {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let bytes = <[u8; SIGNATURE_SIZE]>::decode(r)?;
        Signature::from_bytes(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Encodable for PublicKey {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        self.to_bytes().encode(w)
    }
}

impl Decodable for PublicKey {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let bytes = <[u8; PUBLIC_KEY_SIZE]>::decode(r)?;
        PublicKey::from_bytes(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// The fixed prefix every PrePrepare-family message shares (§4.1): which
/// delegate proposed it, for which epoch/sequence, when, over what
/// previous block, and the primary's own signature over the rest of the
/// block body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrePrepareCommon {
    pub primary_delegate_id: u8,
    pub epoch_number: u32,
    pub sequence: u32,
    pub timestamp_ms: u64,
    pub previous: Hash,
    pub primary_sig: Signature,
}

impl Encodable for PrePrepareCommon {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.primary_delegate_id.encode(w)?;
        n += self.epoch_number.encode(w)?;
        n += self.sequence.encode(w)?;
        n += self.timestamp_ms.encode(w)?;
        n += self.previous.encode(w)?;
        n += self.primary_sig.encode(w)?;
        Ok(n)
    }
}

impl Decodable for PrePrepareCommon {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(PrePrepareCommon {
            primary_delegate_id: u8::decode(r)?,
            epoch_number: u32::decode(r)?,
            sequence: u32::decode(r)?,
            timestamp_ms: u64::decode(r)?,
            previous: Hash::decode(r)?,
            primary_sig: Signature::decode(r)?,
        })
    }
}

/// A backup's vote over a round hash (§4.1 `Prepare`/`Commit`): both
/// messages share this shape, distinguished only by the message type byte
/// in the prequel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegateVote {
    pub delegate_id: u8,
    pub hash: Hash,
    pub sig: Signature,
}

impl Encodable for DelegateVote {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.delegate_id.encode(w)?;
        n += self.hash.encode(w)?;
        n += self.sig.encode(w)?;
        Ok(n)
    }
}

impl Decodable for DelegateVote {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(DelegateVote { delegate_id: u8::decode(r)?, hash: Hash::decode(r)?, sig: Signature::decode(r)? })
    }
}

/// Quorum certificate: which delegates participated (low 32 bits of the
/// bitmap are meaningful, `NUM_DELEGATES == 32`) and the aggregate
/// signature over the round hash (§4.1 `PostPrepare`/`PostCommit`, §6). The
/// round hash itself is not repeated on the wire — it is whatever hash the
/// enclosing `PostPrepare`/`PostCommit` message names (its prequel's `mpf`
/// plus the instance's own `(epoch, sequence)` pin it down), matching the
/// `u64 bitmap | 32-byte agg_sig` wire layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregatedSignature {
    pub participation_map: u64,
    pub agg_sig: Signature,
}

impl AggregatedSignature {
    pub fn participant_count(&self) -> u32 {
        self.participation_map.count_ones()
    }

    pub fn contains(&self, delegate_id: u8) -> bool {
        self.participation_map & (1u64 << delegate_id) != 0
    }
}

impl Encodable for AggregatedSignature {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.participation_map.encode(w)?;
        n += self.agg_sig.encode(w)?;
        Ok(n)
    }
}

impl Decodable for AggregatedSignature {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(AggregatedSignature { participation_map: u64::decode(r)?, agg_sig: Signature::decode(r)? })
    }
}

/// A backup's refusal to vote for the current round (§4.2.2), carrying the
/// reason and — for request-block rounds — a per-request rejection map so
/// the primary can drop just the offending entries and reissue (§4.3.2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub delegate_id: u8,
    pub hash: Hash,
    pub reason: RejectionReason,
    pub rejection_map: Vec<bool>,
    pub sig: Signature,
}

impl Encodable for Rejection {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.delegate_id.encode(w)?;
        n += self.hash.encode(w)?;
        n += (self.reason as u8).encode(w)?;
        n += self.rejection_map.encode(w)?;
        n += self.sig.encode(w)?;
        Ok(n)
    }
}

impl Decodable for Rejection {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let delegate_id = u8::decode(r)?;
        let hash = Hash::decode(r)?;
        let reason = RejectionReason::from_u8(u8::decode(r)?)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unknown rejection reason"))?;
        let rejection_map = Vec::<bool>::decode(r)?;
        let sig = Signature::decode(r)?;
        Ok(Rejection { delegate_id, hash, reason, rejection_map, sig })
    }
}

/// Periodic liveness probe a primary sends its backups between rounds
/// (§4.1 `Heartbeat`), letting an idle backup detect a silently-dead
/// primary faster than `PRIMARY_TIMEOUT` would.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    pub delegate_id: u8,
    pub epoch_number: u32,
}

impl Encodable for Heartbeat {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.delegate_id.encode(w)?;
        n += self.epoch_number.encode(w)?;
        Ok(n)
    }
}

impl Decodable for Heartbeat {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Heartbeat { delegate_id: u8::decode(r)?, epoch_number: u32::decode(r)? })
    }
}

/// Out-of-band delegate public key announcement (§3 Supplemented
/// features), ECIES-sealed to the receiving delegate so only they can read
/// the advertised BLS public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAdvert {
    pub delegate_id: u8,
    pub epoch_number: u32,
    pub sealed_payload: Vec<u8>,
}

impl Encodable for KeyAdvert {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.delegate_id.encode(w)?;
        n += self.epoch_number.encode(w)?;
        n += self.sealed_payload.encode(w)?;
        Ok(n)
    }
}

impl Decodable for KeyAdvert {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(KeyAdvert {
            delegate_id: u8::decode(r)?,
            epoch_number: u32::decode(r)?,
            sealed_payload: Vec::<u8>::decode(r)?,
        })
    }
}

/// Announcement that a block has reached `PostCommit` and is durable
/// (§4.1 `PostCommittedBlock`), broadcast to non-delegate listeners (e.g.
/// bootstrap responders) who don't otherwise see consensus traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostCommittedBlock {
    pub consensus_type: ConsensusType,
    pub hash: Hash,
    pub body: Vec<u8>,
}

impl Encodable for PostCommittedBlock {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.consensus_type.encode(w)?;
        n += self.hash.encode(w)?;
        n += self.body.encode(w)?;
        Ok(n)
    }
}

impl Decodable for PostCommittedBlock {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(PostCommittedBlock {
            consensus_type: ConsensusType::decode(r)?,
            hash: Hash::decode(r)?,
            body: Vec::<u8>::decode(r)?,
        })
    }
}

/// Bootstrap pull request (§4.6.2, §6): `consensus_type` selects which
/// chain family, `previous` is the hash the puller already has, and
/// `target` is the tip it is chasing. For request-block chains the
/// specific delegate index rides in the prequel's `mpf` byte rather than
/// the body, keeping this struct's wire shape identical across all three
/// consensus types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PullRequest {
    pub consensus_type: ConsensusType,
    pub previous: Hash,
    pub target: Hash,
}

impl Encodable for PullRequest {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.consensus_type.encode(w)?;
        n += self.previous.encode(w)?;
        n += self.target.encode(w)?;
        Ok(n)
    }
}

impl Decodable for PullRequest {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(PullRequest {
            consensus_type: ConsensusType::decode(r)?,
            previous: Hash::decode(r)?,
            target: Hash::decode(r)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PullStatus {
    /// More blocks follow this one on the same chain.
    MoreBlock = 0,
    /// This is the last block the responder has for the requested chain.
    LastBlock = 1,
    /// The responder has nothing past `previous` — the requester is
    /// already caught up, or asked about an unknown chain.
    NoBlock = 2,
}

impl PullStatus {
    fn from_u8(v: u8) -> Option<PullStatus> {
        match v {
            0 => Some(PullStatus::MoreBlock),
            1 => Some(PullStatus::LastBlock),
            2 => Some(PullStatus::NoBlock),
            _ => None,
        }
    }
}

impl Encodable for PullStatus {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        (*self as u8).encode(w)
    }
}

impl Decodable for PullStatus {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        PullStatus::from_u8(u8::decode(r)?)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unknown pull status"))
    }
}

/// Bootstrap pull response (§4.6.2): `block` is the encoded block body
/// (empty when `status == NoBlock`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullResponse {
    pub status: PullStatus,
    pub block: Vec<u8>,
}

impl Encodable for PullResponse {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.status.encode(w)?;
        n += self.block.encode(w)?;
        Ok(n)
    }
}

impl Decodable for PullResponse {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(PullResponse { status: PullStatus::decode(r)?, block: Vec::<u8>::decode(r)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::roundtrip;
    use crate::crypto::bls::SecretKey;
    use crate::crypto::hash::hash_bytes;
    use rand::rngs::OsRng;

    #[test]
    fn delegate_vote_roundtrip() {
        let sk = SecretKey::random(&mut OsRng);
        let hash = hash_bytes(b"round 7 batch");
        let vote = DelegateVote { delegate_id: 9, hash, sig: sk.sign(&hash) };
        assert!(roundtrip(&vote));
    }

    #[test]
    fn aggregated_signature_roundtrip() {
        let sk = SecretKey::random(&mut OsRng);
        let hash = hash_bytes(b"quorum hash");
        let agg = AggregatedSignature { participation_map: 0xffff_ffff, agg_sig: sk.sign(&hash) };
        assert_eq!(agg.participant_count(), 32);
        assert!(agg.contains(0));
        assert!(!agg.contains(40));
        assert!(roundtrip(&agg));
    }

    #[test]
    fn rejection_roundtrip() {
        let sk = SecretKey::random(&mut OsRng);
        let hash = hash_bytes(b"rejected batch");
        let rejection = Rejection {
            delegate_id: 4,
            hash,
            reason: RejectionReason::ContainsInvalidRequest,
            rejection_map: vec![false, true, false, true, true],
            sig: sk.sign(&hash),
        };
        assert!(roundtrip(&rejection));
    }

    #[test]
    fn pull_request_response_roundtrip() {
        let req = PullRequest {
            consensus_type: ConsensusType::Request,
            previous: Hash([1u8; 32]),
            target: Hash([2u8; 32]),
        };
        assert!(roundtrip(&req));

        let resp = PullResponse { status: PullStatus::MoreBlock, block: vec![1, 2, 3, 4] };
        assert!(roundtrip(&resp));

        let empty = PullResponse { status: PullStatus::NoBlock, block: Vec::new() };
        assert!(roundtrip(&empty));
    }
}
