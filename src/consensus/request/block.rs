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

//! `Request` (§3 Data model, §4.3.3) and `RequestBlock` (§3, §4.3.1),
//! grounded on `original_source`'s request-block handling
//! (`request_handler.cpp`) for the batching shape, and on the teacher's
//! `sdk`/transaction types for how a signed, fee-bearing user operation is
//! laid out in Rust.

use std::io::{self, Read, Write};

use crate::codec::{Decodable, Encodable};
use crate::crypto::account_sig::{AccountPublicKey, AccountSignature, ACCOUNT_PUB_KEY_SIZE, ACCOUNT_SIG_SIZE};
use crate::crypto::bls::Signature;
use crate::crypto::Hash;
use crate::net::{NUM_DELEGATES, CONSENSUS_BATCH_SIZE};

use crate::net::messages::PrePrepareCommon;

impl Encodable for AccountPublicKey {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        self.to_bytes().encode(w)
    }
}

impl Decodable for AccountPublicKey {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let bytes = <[u8; ACCOUNT_PUB_KEY_SIZE]>::decode(r)?;
        AccountPublicKey::from_bytes(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Encodable for AccountSignature {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        self.to_bytes().encode(w)
    }
}

impl Decodable for AccountSignature {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let bytes = <[u8; ACCOUNT_SIG_SIZE]>::decode(r)?;
        AccountSignature::from_bytes(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// One outgoing transfer within a `Send` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub account: Hash,
    pub amount: u64,
}

impl Encodable for Destination {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.account.encode(w)?;
        n += self.amount.encode(w)?;
        Ok(n)
    }
}

impl Decodable for Destination {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Destination { account: Hash::decode(r)?, amount: u64::decode(r)? })
    }
}

/// A token-admin operation, gated by the signer's controller-privilege bit
/// and the token's corresponding setting bit (§4.3.3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenOperation {
    ChangeController { new_controller: Hash },
    Freeze,
    Unfreeze,
    Revoke { target: Hash, amount: u64 },
    UpdateSetting { bit: u8, value: bool },
}

impl TokenOperation {
    fn tag(&self) -> u8 {
        match self {
            TokenOperation::ChangeController { .. } => 0,
            TokenOperation::Freeze => 1,
            TokenOperation::Unfreeze => 2,
            TokenOperation::Revoke { .. } => 3,
            TokenOperation::UpdateSetting { .. } => 4,
        }
    }
}

impl Encodable for TokenOperation {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.tag().encode(w)?;
        n += match self {
            TokenOperation::ChangeController { new_controller } => new_controller.encode(w)?,
            TokenOperation::Freeze | TokenOperation::Unfreeze => 0,
            TokenOperation::Revoke { target, amount } => target.encode(w)? + amount.encode(w)?,
            TokenOperation::UpdateSetting { bit, value } => bit.encode(w)? + value.encode(w)?,
        };
        Ok(n)
    }
}

impl Decodable for TokenOperation {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(match u8::decode(r)? {
            0 => TokenOperation::ChangeController { new_controller: Hash::decode(r)? },
            1 => TokenOperation::Freeze,
            2 => TokenOperation::Unfreeze,
            3 => TokenOperation::Revoke { target: Hash::decode(r)?, amount: u64::decode(r)? },
            4 => TokenOperation::UpdateSetting { bit: u8::decode(r)?, value: bool::decode(r)? },
            _ => return Err(io::Error::new(io::ErrorKind::InvalidData, "unknown token operation tag")),
        })
    }
}

/// The tagged union of user and governance operations a `Request` can
/// carry (§3). `ElectionVote.candidates` is capped at 8 entries (§4.3.3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    Send { destinations: Vec<Destination> },
    ChangeRep { representative: Hash },
    TokenAdmin { token: Hash, op: TokenOperation },
    Proxy { representative: Hash },
    StartRepresenting,
    AnnounceCandidacy { stake: u64 },
    RenounceCandidacy,
    ElectionVote { candidates: Vec<Hash> },
}

impl RequestBody {
    fn tag(&self) -> u8 {
        match self {
            RequestBody::Send { .. } => 0,
            RequestBody::ChangeRep { .. } => 1,
            RequestBody::TokenAdmin { .. } => 2,
            RequestBody::Proxy { .. } => 3,
            RequestBody::StartRepresenting => 4,
            RequestBody::AnnounceCandidacy { .. } => 5,
            RequestBody::RenounceCandidacy => 6,
            RequestBody::ElectionVote { .. } => 7,
        }
    }

    pub fn is_governance(&self) -> bool {
        matches!(
            self,
            RequestBody::Proxy { .. }
                | RequestBody::StartRepresenting
                | RequestBody::AnnounceCandidacy { .. }
                | RequestBody::RenounceCandidacy
                | RequestBody::ElectionVote { .. }
        )
    }
}

impl Encodable for RequestBody {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.tag().encode(w)?;
        n += match self {
            RequestBody::Send { destinations } => destinations.encode(w)?,
            RequestBody::ChangeRep { representative } => representative.encode(w)?,
            RequestBody::TokenAdmin { token, op } => token.encode(w)? + op.encode(w)?,
            RequestBody::Proxy { representative } => representative.encode(w)?,
            RequestBody::StartRepresenting | RequestBody::RenounceCandidacy => 0,
            RequestBody::AnnounceCandidacy { stake } => stake.encode(w)?,
            RequestBody::ElectionVote { candidates } => candidates.encode(w)?,
        };
        Ok(n)
    }
}

impl Decodable for RequestBody {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(match u8::decode(r)? {
            0 => RequestBody::Send { destinations: Vec::<Destination>::decode(r)? },
            1 => RequestBody::ChangeRep { representative: Hash::decode(r)? },
            2 => RequestBody::TokenAdmin { token: Hash::decode(r)?, op: TokenOperation::decode(r)? },
            3 => RequestBody::Proxy { representative: Hash::decode(r)? },
            4 => RequestBody::StartRepresenting,
            5 => RequestBody::AnnounceCandidacy { stake: u64::decode(r)? },
            6 => RequestBody::RenounceCandidacy,
            7 => {
                let candidates = Vec::<Hash>::decode(r)?;
                if candidates.len() > 8 {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "election vote lists more than 8 candidates"))
                }
                RequestBody::ElectionVote { candidates }
            }
            _ => return Err(io::Error::new(io::ErrorKind::InvalidData, "unknown request body tag")),
        })
    }
}

/// A single user or governance operation, signed by its origin account
/// (§3, §4.3.3). `sequence` and `previous` pin it to the origin's
/// subchain; `fee` is paid in the native token's base unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub origin: Hash,
    pub previous: Hash,
    pub sequence: u32,
    pub fee: u64,
    pub timestamp_ms: u64,
    pub body: RequestBody,
    pub origin_pubkey: AccountPublicKey,
    pub signature: AccountSignature,
}

impl Request {
    /// Content hashed into the request's own (pre-signature) digest: every
    /// field except the signature itself.
    pub fn signing_hash(&self) -> Hash {
        use crate::crypto::hash::Hasher;
        let mut hasher = Hasher::new();
        hasher.update_hash(&self.origin);
        hasher.update_hash(&self.previous);
        hasher.update_u32(self.sequence);
        hasher.update_u64(self.fee);
        hasher.update_u64(self.timestamp_ms);
        hasher.update(&self.body.encode_to_vec());
        hasher.finalize()
    }
}

impl Encodable for Request {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.origin.encode(w)?;
        n += self.previous.encode(w)?;
        n += self.sequence.encode(w)?;
        n += self.fee.encode(w)?;
        n += self.timestamp_ms.encode(w)?;
        n += self.body.encode(w)?;
        n += self.origin_pubkey.encode(w)?;
        n += self.signature.encode(w)?;
        Ok(n)
    }
}

impl Decodable for Request {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Request {
            origin: Hash::decode(r)?,
            previous: Hash::decode(r)?,
            sequence: u32::decode(r)?,
            fee: u64::decode(r)?,
            timestamp_ms: u64::decode(r)?,
            body: RequestBody::decode(r)?,
            origin_pubkey: AccountPublicKey::decode(r)?,
            signature: AccountSignature::decode(r)?,
        })
    }
}

/// A committed batch of up to [`CONSENSUS_BATCH_SIZE`] requests on one
/// delegate's chain (§3, §4.3.1), grounded on
/// `original_source/logos/consensus/request/request_handler.cpp`'s
/// `PrepareNextBatch`/`GetCurrentBatch`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBlock {
    pub common: PrePrepareCommon,
    pub requests: Vec<Request>,
    pub prepare_participation_map: u64,
    pub prepare_agg_sig: Signature,
    pub commit_participation_map: u64,
    pub commit_agg_sig: Signature,
}

impl RequestBlock {
    pub fn delegate_id(&self) -> u8 {
        self.common.primary_delegate_id
    }

    pub fn is_full(&self) -> bool {
        self.requests.len() >= CONSENSUS_BATCH_SIZE
    }
}

impl super::super::common::Hashable for RequestBlock {
    fn kind(&self) -> super::super::common::BlockKind {
        super::super::common::BlockKind::Request {
            primary_delegate_id: self.common.primary_delegate_id,
            timestamp_ms: self.common.timestamp_ms,
        }
    }

    fn epoch_number(&self) -> u32 {
        self.common.epoch_number
    }

    fn sequence(&self) -> u32 {
        self.common.sequence
    }

    fn previous(&self) -> Hash {
        self.common.previous
    }

    fn content_bytes(&self) -> Vec<u8> {
        self.requests.encode_to_vec()
    }
}

impl Encodable for RequestBlock {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.common.encode(w)?;
        n += self.requests.encode(w)?;
        n += self.prepare_participation_map.encode(w)?;
        n += self.prepare_agg_sig.encode(w)?;
        n += self.commit_participation_map.encode(w)?;
        n += self.commit_agg_sig.encode(w)?;
        Ok(n)
    }
}

impl Decodable for RequestBlock {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(RequestBlock {
            common: PrePrepareCommon::decode(r)?,
            requests: Vec::<Request>::decode(r)?,
            prepare_participation_map: u64::decode(r)?,
            prepare_agg_sig: Signature::decode(r)?,
            commit_participation_map: u64::decode(r)?,
            commit_agg_sig: Signature::decode(r)?,
        })
    }
}

/// `NUM_DELEGATES` request-block chains run in parallel, one per delegate.
pub const NUM_CHAINS: usize = NUM_DELEGATES;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::roundtrip;
    use crate::crypto::account_sig::AccountKeyPair;
    use crate::crypto::bls::SecretKey;
    use rand::rngs::OsRng;

    fn sample_request(sequence: u32) -> Request {
        let keypair = AccountKeyPair::generate();
        let mut request = Request {
            origin: keypair.public_key().to_account_hash(),
            previous: Hash::ZERO,
            sequence,
            fee: 10_000_000_000_000_000_000_000,
            timestamp_ms: 1,
            body: RequestBody::Send { destinations: vec![Destination { account: Hash([9u8; 32]), amount: 5 }] },
            origin_pubkey: keypair.public_key(),
            signature: AccountSignature::from_bytes(&[0u8; ACCOUNT_SIG_SIZE]).unwrap(),
        };
        let hash = request.signing_hash();
        request.signature = keypair.sign(&hash);
        request
    }

    #[test]
    fn request_roundtrips() {
        let request = sample_request(1);
        assert!(roundtrip(&request));
    }

    #[test]
    fn election_vote_over_eight_candidates_errors() {
        let mut buf = Vec::new();
        let tag = 7u8;
        tag.encode(&mut buf).unwrap();
        let candidates: Vec<Hash> = (0..9).map(|i| Hash([i as u8; 32])).collect();
        candidates.encode(&mut buf).unwrap();
        let mut cursor = io::Cursor::new(&buf[..]);
        assert!(RequestBody::decode(&mut cursor).is_err());
    }

    #[test]
    fn request_block_roundtrips() {
        let sk = SecretKey::random(&mut OsRng);
        let hash = crate::crypto::hash::hash_bytes(b"round hash");
        let block = RequestBlock {
            common: PrePrepareCommon {
                primary_delegate_id: 4,
                epoch_number: 2,
                sequence: 0,
                timestamp_ms: 123,
                previous: Hash::ZERO,
                primary_sig: sk.sign(&hash),
            },
            requests: vec![sample_request(1), sample_request(2)],
            prepare_participation_map: 0xffff_ffff,
            prepare_agg_sig: sk.sign(&hash),
            commit_participation_map: 0xffff_ffff,
            commit_agg_sig: sk.sign(&hash),
        };
        assert!(roundtrip(&block));
        assert!(!block.is_full());
    }
}
