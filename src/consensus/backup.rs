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

//! The backup delegate's side of a round (§4.2.2).

use crate::crypto::Hash;
use crate::error::{Error, ProtocolError, RejectionReason, Result};
use crate::net::{AggregatedSignature, ConsensusType, MessageHeader, MessageType, NetIO};
use crate::validator::MessageValidator;

use super::state::RoundState;
use super::timer::clock_drift_allowance_ms;
use super::types::QuorumWeights;

/// A PrePrepare's prequel fields, as seen by a backup validating it
/// against local expectations (§4.2.2).
pub struct PrePrepareHeader {
    pub primary_delegate_id: u8,
    pub epoch_number: u32,
    pub sequence: u32,
    pub timestamp_ms: u64,
    pub previous: Hash,
}

/// Checks a PrePrepare's header fields against local expectations,
/// returning the first applicable rejection reason, or `None` if the
/// header is acceptable and the backup should proceed to content
/// validation (§4.3.3 for Request consensus).
pub fn validate_pre_prepare_header(
    header: &PrePrepareHeader,
    expected_epoch: u32,
    expected_sequence: u32,
    local_previous: &Hash,
    now_ms: u64,
    in_epoch_transition: bool,
) -> Option<RejectionReason> {
    if in_epoch_transition {
        return Some(RejectionReason::NewEpoch)
    }
    if header.epoch_number != expected_epoch {
        return Some(RejectionReason::InvalidEpoch)
    }
    if header.sequence != expected_sequence {
        return Some(RejectionReason::WrongSequenceNumber)
    }
    if &header.previous != local_previous {
        return Some(RejectionReason::InvalidPreviousHash)
    }
    let allowance = clock_drift_allowance_ms(header.primary_delegate_id);
    let drift = now_ms.abs_diff(header.timestamp_ms);
    if drift > allowance {
        return Some(RejectionReason::ClockDrift)
    }
    None
}

/// Drives one backup-side round, mirroring [`super::primary::PrimaryDriver`].
pub struct BackupDriver<'a> {
    pub validator: &'a MessageValidator,
    pub netio: &'a dyn NetIO,
    pub weights: &'a dyn QuorumWeights,
}

impl<'a> BackupDriver<'a> {
    /// Signs and sends a `Prepare` for an accepted pre-prepare (§4.2.2).
    pub async fn send_prepare(
        &self,
        round: &mut RoundState,
        consensus_type: ConsensusType,
        delegate_id: u8,
        round_hash: Hash,
    ) -> Result<()> {
        round.begin_pre_prepare(round_hash);
        let sig = self.validator.sign(&round_hash)?;

        use crate::codec::Encodable;
        use crate::net::DelegateVote;
        let vote = DelegateVote { delegate_id, hash: round_hash, sig };
        let payload = vote.encode_to_vec();
        let header = MessageHeader::new(MessageType::Prepare, consensus_type, delegate_id, payload.len() as u32);
        self.netio.broadcast(consensus_type, header, payload).await
    }

    /// Sends a `Rejection` instead, per §4.2.2.
    pub async fn send_rejection(
        &self,
        consensus_type: ConsensusType,
        delegate_id: u8,
        round_hash: Hash,
        reason: RejectionReason,
        rejection_map: Vec<bool>,
    ) -> Result<()> {
        let sig = self.validator.sign(&round_hash)?;

        use crate::codec::Encodable;
        use crate::net::Rejection;
        let rejection = Rejection { delegate_id, hash: round_hash, reason, rejection_map, sig };
        let payload = rejection.encode_to_vec();
        let header = MessageHeader::new(MessageType::Rejection, consensus_type, delegate_id, payload.len() as u32);
        self.netio.broadcast(consensus_type, header, payload).await
    }

    /// Verifies an inbound `PostPrepare` against this backup's own copy of
    /// the round hash, then signs and sends `Commit` (§4.2.2).
    pub async fn receive_post_prepare(
        &self,
        round: &mut RoundState,
        consensus_type: ConsensusType,
        delegate_id: u8,
        agg: &AggregatedSignature,
    ) -> Result<()> {
        let expected = round.round_hash.ok_or(Error::Protocol(ProtocolError::UnexpectedMessage))?;
        if !super::types::bitmap_reaches_quorum(agg.participation_map, self.weights) {
            return Err(Error::Protocol(ProtocolError::UnexpectedMessage))
        }
        if !crate::crypto::bls::verify_aggregate(
            &expected,
            agg.participation_map,
            &agg.agg_sig,
            self.validator.committee(),
        ) {
            return Err(Error::Protocol(ProtocolError::BadSignature))
        }
        round.enter_post_prepare();

        let sig = self.validator.sign(&expected)?;
        use crate::codec::Encodable;
        use crate::net::DelegateVote;
        let vote = DelegateVote { delegate_id, hash: expected, sig };
        let payload = vote.encode_to_vec();
        let header = MessageHeader::new(MessageType::Commit, consensus_type, delegate_id, payload.len() as u32);
        self.netio.broadcast(consensus_type, header, payload).await
    }

    /// Verifies an inbound `PostCommit`; the caller applies the block and
    /// resets `round` for the next sequence afterwards (§4.2.2).
    pub fn receive_post_commit(&self, round: &RoundState, agg: &AggregatedSignature) -> Result<()> {
        let expected = round.round_hash.ok_or(Error::Protocol(ProtocolError::UnexpectedMessage))?;
        if !super::types::bitmap_reaches_quorum(agg.participation_map, self.weights) {
            return Err(Error::Protocol(ProtocolError::UnexpectedMessage))
        }
        if !crate::crypto::bls::verify_aggregate(
            &expected,
            agg.participation_map,
            &agg.agg_sig,
            self.validator.committee(),
        ) {
            return Err(Error::Protocol(ProtocolError::BadSignature))
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_validation_picks_first_applicable_reason() {
        let header = PrePrepareHeader {
            primary_delegate_id: 0,
            epoch_number: 5,
            sequence: 10,
            timestamp_ms: 1_000_000,
            previous: Hash([1u8; 32]),
        };

        assert_eq!(
            validate_pre_prepare_header(&header, 5, 10, &Hash([1u8; 32]), 1_000_000, true),
            Some(RejectionReason::NewEpoch)
        );
        assert_eq!(
            validate_pre_prepare_header(&header, 6, 10, &Hash([1u8; 32]), 1_000_000, false),
            Some(RejectionReason::InvalidEpoch)
        );
        assert_eq!(
            validate_pre_prepare_header(&header, 5, 11, &Hash([1u8; 32]), 1_000_000, false),
            Some(RejectionReason::WrongSequenceNumber)
        );
        assert_eq!(
            validate_pre_prepare_header(&header, 5, 10, &Hash([2u8; 32]), 1_000_000, false),
            Some(RejectionReason::InvalidPreviousHash)
        );
        assert_eq!(
            validate_pre_prepare_header(&header, 5, 10, &Hash([1u8; 32]), 1_100_000, false),
            Some(RejectionReason::ClockDrift)
        );
        assert_eq!(validate_pre_prepare_header(&header, 5, 10, &Hash([1u8; 32]), 1_000_000, false), None);
    }

    #[test]
    fn secondary_proposer_gets_more_drift_allowance() {
        let header = PrePrepareHeader {
            primary_delegate_id: 3,
            epoch_number: 1,
            sequence: 0,
            timestamp_ms: 1_000_000,
            previous: Hash::ZERO,
        };
        // 3 * MAX_CLOCK_DRIFT_MS * ... allowance is (id+1)*20000 = 80000
        assert_eq!(
            validate_pre_prepare_header(&header, 1, 0, &Hash::ZERO, 1_000_000 + 79_000, false),
            None
        );
        assert_eq!(
            validate_pre_prepare_header(&header, 1, 0, &Hash::ZERO, 1_000_000 + 81_000, false),
            Some(RejectionReason::ClockDrift)
        );
    }
}
